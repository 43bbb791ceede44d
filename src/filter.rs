//! Per-kind admission filtering.
//!
//! The filter is a bitmask over the identifier space: a kind is either
//! blocked (bit set) or admitted (bit clear), nothing in between.
//! Blocking or allowing a kind that already is in that state is a
//! no-op. Kinds at or above the ceiling have no bit and are always
//! admitted.

use std::fmt;
use tracing::debug;

/// Selects one kind, several kinds, or every kind at once.
///
/// The `All` sentinel is what the documented "block everything" /
/// "allow everything" calls use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    One(u32),
    Many(Vec<u32>),
}

impl Selector {
    pub fn matches(&self, kind: u32) -> bool {
        match self {
            Selector::All => true,
            Selector::One(k) => *k == kind,
            Selector::Many(kinds) => kinds.contains(&kind),
        }
    }
}

impl From<u32> for Selector {
    fn from(kind: u32) -> Self {
        Selector::One(kind)
    }
}

impl From<Vec<u32>> for Selector {
    fn from(kinds: Vec<u32>) -> Self {
        Selector::Many(kinds)
    }
}

impl From<&[u32]> for Selector {
    fn from(kinds: &[u32]) -> Self {
        Selector::Many(kinds.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for Selector {
    fn from(kinds: [u32; N]) -> Self {
        Selector::Many(kinds.to_vec())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "all kinds"),
            Selector::One(k) => write!(f, "kind {}", k),
            Selector::Many(kinds) => write!(f, "kinds {:?}", kinds),
        }
    }
}

/// Blocked-kind state consulted on every enqueue attempt.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    bits: Vec<u64>,
    ceiling: u32,
}

impl AdmissionFilter {
    /// A filter admitting everything up to `ceiling`.
    pub fn new(ceiling: u32) -> Self {
        let words = (ceiling as usize).div_ceil(64);
        Self {
            bits: vec![0; words],
            ceiling,
        }
    }

    pub fn set_blocked(&mut self, selector: &Selector) {
        debug!("Blocking {}", selector);
        match selector {
            Selector::All => self.bits.fill(u64::MAX),
            Selector::One(k) => self.set_bit(*k),
            Selector::Many(kinds) => {
                for k in kinds {
                    self.set_bit(*k);
                }
            }
        }
    }

    pub fn set_allowed(&mut self, selector: &Selector) {
        debug!("Allowing {}", selector);
        match selector {
            Selector::All => self.bits.fill(0),
            Selector::One(k) => self.clear_bit(*k),
            Selector::Many(kinds) => {
                for k in kinds {
                    self.clear_bit(*k);
                }
            }
        }
    }

    /// True if ANY selected kind is blocked.
    pub fn is_blocked(&self, selector: &Selector) -> bool {
        match selector {
            Selector::All => self.bits.iter().any(|w| *w != 0),
            Selector::One(k) => self.is_blocked_kind(*k),
            Selector::Many(kinds) => kinds.iter().any(|k| self.is_blocked_kind(*k)),
        }
    }

    pub fn is_blocked_kind(&self, kind: u32) -> bool {
        if kind >= self.ceiling {
            return false;
        }
        self.bits[(kind / 64) as usize] & (1u64 << (kind % 64)) != 0
    }

    /// Every currently blocked kind, ascending.
    pub fn blocked_kinds(&self) -> Vec<u32> {
        (0..self.ceiling)
            .filter(|k| self.is_blocked_kind(*k))
            .collect()
    }

    fn set_bit(&mut self, kind: u32) {
        if kind < self.ceiling {
            self.bits[(kind / 64) as usize] |= 1u64 << (kind % 64);
        }
    }

    fn clear_bit(&mut self, kind: u32) {
        if kind < self.ceiling {
            self.bits[(kind / 64) as usize] &= !(1u64 << (kind % 64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_admits_everything() {
        let filter = AdmissionFilter::new(256);
        assert!(!filter.is_blocked(&Selector::All));
        assert!(!filter.is_blocked_kind(0));
        assert!(!filter.is_blocked_kind(255));
        assert!(filter.blocked_kinds().is_empty());
    }

    #[test]
    fn block_and_allow_round_trip() {
        let mut filter = AdmissionFilter::new(256);
        filter.set_blocked(&Selector::One(7));
        assert!(filter.is_blocked_kind(7));
        assert!(!filter.is_blocked_kind(8));

        filter.set_allowed(&Selector::One(7));
        assert!(!filter.is_blocked_kind(7));
    }

    #[test]
    fn toggling_is_idempotent() {
        let mut filter = AdmissionFilter::new(256);
        filter.set_blocked(&Selector::One(3));
        filter.set_blocked(&Selector::One(3));
        assert_eq!(filter.blocked_kinds(), vec![3]);

        filter.set_allowed(&Selector::One(3));
        filter.set_allowed(&Selector::One(3));
        assert!(filter.blocked_kinds().is_empty());
    }

    #[test]
    fn sequence_blocking_is_any_not_all() {
        let mut filter = AdmissionFilter::new(256);
        filter.set_blocked(&Selector::One(5));
        assert!(filter.is_blocked(&Selector::from([4, 5, 6])));
        assert!(!filter.is_blocked(&Selector::from([4, 6])));
    }

    #[test]
    fn all_sentinel_blocks_and_clears_everything() {
        let mut filter = AdmissionFilter::new(130);
        filter.set_blocked(&Selector::All);
        assert!(filter.is_blocked_kind(0));
        assert!(filter.is_blocked_kind(129));
        assert_eq!(filter.blocked_kinds().len(), 130);

        filter.set_allowed(&Selector::All);
        assert!(filter.blocked_kinds().is_empty());
    }

    #[test]
    fn kinds_above_ceiling_are_always_admitted() {
        let mut filter = AdmissionFilter::new(64);
        filter.set_blocked(&Selector::All);
        assert!(!filter.is_blocked_kind(64));
        assert!(!filter.is_blocked_kind(1_000_000));
    }
}
