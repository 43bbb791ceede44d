//! Bounded in-process event queue with admission filtering.
//!
//! Typed messages flow from the platform/input layer into a bounded
//! FIFO and out to application code once per frame:
//!
//! ```text
//! Platform ──► PumpBridge ──► EventQueue ──► get/poll/wait
//!              (translate)    (admission,
//!                              capacity)
//! ```
//!
//! The queue never blocks a producer: posts against a full queue or of
//! a blocked kind return `false` and are dropped. Draining is the
//! owner thread's business; [`EventQueue::wait`] is the one blocking
//! call, a condvar wait signaled by every successful enqueue.
//!
//! [`system::EventSystem`] bundles the queue with the kind registry and
//! the pump bridge into the single per-process context the subsystem is
//! meant to be used through.

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod pump;
pub mod queue;
pub mod registry;
pub mod system;

pub use config::{ConfigError, Settings};
pub use error::UsageError;
pub use event::{AttrValue, Event};
pub use filter::{AdmissionFilter, Selector};
pub use pump::{NativeNotification, PumpBridge};
pub use queue::EventQueue;
pub use registry::{RegistryError, TypeRegistry};
pub use system::EventSystem;
