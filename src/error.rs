//! Usage errors shared across the event and queue surfaces.
//!
//! Only misuse of the API is an error here. Empty queues, full queues,
//! blocked kinds and zero-match selections are ordinary return values,
//! because a polling loop hits them constantly.

use thiserror::Error;

/// Errors raised for API misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// `get`/`clear` accept a selector or an exclusion, not both.
    #[error("selector and exclude are mutually exclusive; supply at most one")]
    ConflictingSelectors,

    /// The `type` attribute mirrors the event kind and is assigned once
    /// at construction.
    #[error("the `type` attribute is read-only")]
    KindReadOnly,
}
