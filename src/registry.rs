//! Event kind registry.
//!
//! Kind identifiers are split into a system-reserved range (fixed at
//! construction) and a custom range above it. Custom kinds are handed
//! out by a monotonic cursor and never reused; there is no free
//! operation, so a feature that allocated a kind and was torn down
//! simply leaves a hole behind.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;

/// Sentinel kind carried by the "no event" value.
pub const NO_EVENT: u32 = 0;
/// Request to shut the application down.
pub const QUIT: u32 = 1;
pub const KEY_DOWN: u32 = 2;
pub const KEY_UP: u32 = 3;
pub const MOUSE_MOTION: u32 = 4;
pub const MOUSE_BUTTON_DOWN: u32 = 5;
pub const MOUSE_BUTTON_UP: u32 = 6;
pub const WINDOW_SHOWN: u32 = 7;
pub const WINDOW_RESIZED: u32 = 8;
pub const FOCUS_GAINED: u32 = 9;
pub const FOCUS_LOST: u32 = 10;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The custom kind space is used up. The cursor stays where it was,
    /// so repeated calls keep failing rather than wrapping around.
    #[error("custom event kind space exhausted (ceiling {ceiling})")]
    Exhausted { ceiling: u32 },
}

/// Tracks reserved and custom kind ranges and the allocation cursor.
#[derive(Debug)]
pub struct TypeRegistry {
    reserved_end: u32,
    ceiling: u32,
    next_custom: u32,
}

impl TypeRegistry {
    pub fn new(settings: &Settings) -> Self {
        debug!(
            "Kind registry: reserved 0..{}, custom {}..{}",
            settings.reserved_end, settings.reserved_end, settings.ceiling
        );
        Self {
            reserved_end: settings.reserved_end,
            ceiling: settings.ceiling,
            next_custom: settings.reserved_end,
        }
    }

    /// Reserves the next free custom kind identifier.
    pub fn allocate_custom(&mut self) -> Result<u32, RegistryError> {
        if self.next_custom >= self.ceiling {
            warn!(
                "Custom kind allocation failed, space exhausted at {}",
                self.ceiling
            );
            return Err(RegistryError::Exhausted {
                ceiling: self.ceiling,
            });
        }
        let kind = self.next_custom;
        self.next_custom += 1;
        debug!("Allocated custom event kind {}", kind);
        Ok(kind)
    }

    pub fn is_reserved(&self, kind: u32) -> bool {
        kind < self.reserved_end
    }

    /// Human-readable name for a kind.
    ///
    /// Custom-range kinds all answer `"UserEvent"`, allocated or not;
    /// the registry deliberately does not distinguish the two. Kinds
    /// outside both ranges, and reserved kinds no system event maps to,
    /// answer `"Unknown"`.
    pub fn name_of(&self, kind: u32) -> &'static str {
        if kind >= self.reserved_end && kind < self.ceiling {
            return "UserEvent";
        }
        match kind {
            NO_EVENT => "NoEvent",
            QUIT => "Quit",
            KEY_DOWN => "KeyDown",
            KEY_UP => "KeyUp",
            MOUSE_MOTION => "MouseMotion",
            MOUSE_BUTTON_DOWN => "MouseButtonDown",
            MOUSE_BUTTON_UP => "MouseButtonUp",
            WINDOW_SHOWN => "WindowShown",
            WINDOW_RESIZED => "WindowResized",
            FOCUS_GAINED => "FocusGained",
            FOCUS_LOST => "FocusLost",
            _ => "Unknown",
        }
    }

    /// Next identifier `allocate_custom` would return.
    pub fn next_custom(&self) -> u32 {
        self.next_custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_registry(reserved_end: u32, ceiling: u32) -> TypeRegistry {
        TypeRegistry::new(&Settings {
            capacity: 8,
            reserved_end,
            ceiling,
        })
    }

    #[test]
    fn allocations_are_distinct_and_increasing() {
        let mut registry = small_registry(16, 24);
        let kinds: Vec<u32> = (0..8).map(|_| registry.allocate_custom().unwrap()).collect();
        assert_eq!(kinds, vec![16, 17, 18, 19, 20, 21, 22, 23]);
        assert!(kinds.iter().all(|k| *k >= 16 && *k < 24));
    }

    #[test]
    fn exhaustion_leaves_cursor_unchanged() {
        let mut registry = small_registry(16, 18);
        registry.allocate_custom().unwrap();
        registry.allocate_custom().unwrap();
        let before = registry.next_custom();
        assert_eq!(
            registry.allocate_custom(),
            Err(RegistryError::Exhausted { ceiling: 18 })
        );
        assert_eq!(registry.next_custom(), before);
        // Still failing, still not moving.
        assert!(registry.allocate_custom().is_err());
        assert_eq!(registry.next_custom(), before);
    }

    #[test]
    fn reserved_range_check() {
        let registry = small_registry(16, 24);
        assert!(registry.is_reserved(0));
        assert!(registry.is_reserved(15));
        assert!(!registry.is_reserved(16));
        assert!(!registry.is_reserved(1000));
    }

    #[test]
    fn names_cover_all_three_ranges() {
        let registry = TypeRegistry::new(&Settings::default());
        assert_eq!(registry.name_of(QUIT), "Quit");
        assert_eq!(registry.name_of(MOUSE_BUTTON_DOWN), "MouseButtonDown");
        assert_eq!(registry.name_of(0x8000), "UserEvent");
        assert_eq!(registry.name_of(0xFFFF), "UserEvent");
        assert_eq!(registry.name_of(0x1_0000), "Unknown");
        // Reserved hole with no system event behind it.
        assert_eq!(registry.name_of(0x4000), "Unknown");
    }

    #[test]
    fn user_event_name_ignores_allocation_state() {
        let mut registry = small_registry(16, 24);
        assert_eq!(registry.name_of(16), "UserEvent");
        registry.allocate_custom().unwrap();
        assert_eq!(registry.name_of(16), "UserEvent");
        assert_eq!(registry.name_of(23), "UserEvent");
    }
}
