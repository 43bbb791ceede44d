//! Event records.
//!
//! An event is a kind identifier plus an open attribute map: any name
//! can be read, written or removed after construction, except `type`,
//! which mirrors the kind and is read-only. The map lives behind a
//! shared handle, so cloning an event is the documented shallow copy;
//! both clones see the same attributes until one calls [`Event::deep_copy`].

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::UsageError;
use crate::registry::NO_EVENT;

/// Attribute name that mirrors the event kind.
pub const KIND_ATTR: &str = "type";

/// A single attribute value. Names are open-ended, but every stored
/// value has a definite type from this closed set.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Time(DateTime<Local>),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<DateTime<Local>> for AttrValue {
    fn from(v: DateTime<Local>) -> Self {
        AttrValue::Time(v)
    }
}

/// A typed message flowing through the queue.
///
/// `Clone` shares the attribute map. A poster that keeps mutating its
/// copy after posting is mutating the queued copy too; callers wanting
/// isolation deep-copy before posting.
#[derive(Debug, Clone)]
pub struct Event {
    kind: u32,
    attrs: Arc<Mutex<HashMap<String, AttrValue>>>,
}

impl Event {
    /// Creates an event with no attributes. The kind is not range
    /// checked here; only admission into a queue cares about that.
    pub fn new(kind: u32) -> Self {
        Self {
            kind,
            attrs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates an event from ad hoc name/value pairs or a prebuilt map;
    /// both forms merge into the same attribute map.
    pub fn with_attrs<K, V, I>(kind: u32, attrs: I) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            kind,
            attrs: Arc::new(Mutex::new(map)),
        }
    }

    /// The "no event" sentinel returned by drains of an empty queue.
    pub fn none() -> Self {
        Self::new(NO_EVENT)
    }

    pub fn is_none(&self) -> bool {
        self.kind == NO_EVENT
    }

    pub fn kind(&self) -> u32 {
        self.kind
    }

    /// Reads an attribute. `type` reads back the kind as an integer.
    pub fn attr(&self, name: &str) -> Option<AttrValue> {
        if name == KIND_ATTR {
            return Some(AttrValue::Int(self.kind as i64));
        }
        self.lock_attrs().get(name).cloned()
    }

    /// Sets an attribute, present at construction or not. Only `type`
    /// is refused.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<AttrValue>) -> Result<(), UsageError> {
        let name = name.into();
        if name == KIND_ATTR {
            return Err(UsageError::KindReadOnly);
        }
        self.lock_attrs().insert(name, value.into());
        Ok(())
    }

    /// Removes an attribute, returning the old value if it was present.
    pub fn remove_attr(&self, name: &str) -> Result<Option<AttrValue>, UsageError> {
        if name == KIND_ATTR {
            return Err(UsageError::KindReadOnly);
        }
        Ok(self.lock_attrs().remove(name))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        name == KIND_ATTR || self.lock_attrs().contains_key(name)
    }

    /// An isolated copy: same kind, a fresh attribute map with the same
    /// contents.
    pub fn deep_copy(&self) -> Self {
        let map = self.lock_attrs().clone();
        Self {
            kind: self.kind,
            attrs: Arc::new(Mutex::new(map)),
        }
    }

    fn lock_attrs(&self) -> MutexGuard<'_, HashMap<String, AttrValue>> {
        self.attrs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if Arc::ptr_eq(&self.attrs, &other.attrs) {
            return true;
        }
        // Clone one side first so the two locks are never held at once.
        let mine = self.lock_attrs().clone();
        mine == *other.lock_attrs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::KEY_DOWN;

    #[test]
    fn attributes_are_an_open_record() {
        let event = Event::with_attrs(KEY_DOWN, [("scancode", 44)]);
        assert_eq!(event.attr("scancode"), Some(AttrValue::Int(44)));

        // Names unseen at construction can be added, changed, removed.
        event.set_attr("repeat", true).unwrap();
        assert_eq!(event.attr("repeat"), Some(AttrValue::Bool(true)));
        event.set_attr("repeat", false).unwrap();
        assert_eq!(event.attr("repeat"), Some(AttrValue::Bool(false)));
        assert_eq!(
            event.remove_attr("repeat").unwrap(),
            Some(AttrValue::Bool(false))
        );
        assert_eq!(event.attr("repeat"), None);
    }

    #[test]
    fn kind_attribute_is_read_only() {
        let event = Event::new(KEY_DOWN);
        assert_eq!(event.attr("type"), Some(AttrValue::Int(KEY_DOWN as i64)));
        assert_eq!(
            event.set_attr("type", 99),
            Err(UsageError::KindReadOnly)
        );
        assert_eq!(event.remove_attr("type"), Err(UsageError::KindReadOnly));
        assert_eq!(event.kind(), KEY_DOWN);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = Event::with_attrs(7, [("x", 1), ("y", 2)]);
        let b = Event::with_attrs(7, [("y", 2), ("x", 1)]);
        assert_eq!(a, b);

        let c = Event::with_attrs(7, [("x", 1), ("y", 3)]);
        assert_ne!(a, c);

        let d = Event::with_attrs(8, [("x", 1), ("y", 2)]);
        assert_ne!(a, d);
    }

    #[test]
    fn clone_shares_attributes_deep_copy_does_not() {
        let original = Event::with_attrs(7, [("x", 1)]);
        let shallow = original.clone();
        let deep = original.deep_copy();

        original.set_attr("x", 2).unwrap();
        assert_eq!(shallow.attr("x"), Some(AttrValue::Int(2)));
        assert_eq!(deep.attr("x"), Some(AttrValue::Int(1)));
    }

    #[test]
    fn none_sentinel() {
        let none = Event::none();
        assert!(none.is_none());
        assert_eq!(none.kind(), NO_EVENT);
        assert!(!Event::new(KEY_DOWN).is_none());
    }
}
