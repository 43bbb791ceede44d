//! The event subsystem context.
//!
//! One [`EventSystem`] per process stands in for what the source
//! platform kept as implicit global state: it owns the kind registry,
//! the queue (and with it the admission filter), and the pump bridge.
//! Construct it at subsystem init, drop it at shutdown.
//!
//! # Thread ownership
//!
//! Draining calls (`pump`, `get`, `poll`, `wait`, `peek`, `clear`) are
//! safe only from the thread that owns the display/input surface. This
//! is a usage contract, not a runtime check. [`EventSystem::post`] and
//! the cloned handle from [`EventSystem::queue`] are fine from any
//! thread.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::error::UsageError;
use crate::event::Event;
use crate::filter::Selector;
use crate::pump::PumpBridge;
use crate::queue::EventQueue;
use crate::registry::{RegistryError, TypeRegistry};

pub struct EventSystem {
    queue: EventQueue,
    registry: Mutex<TypeRegistry>,
    bridge: Mutex<PumpBridge>,
}

impl EventSystem {
    pub fn new(settings: &Settings, bridge: PumpBridge) -> Self {
        info!("Initializing event subsystem");
        Self {
            queue: EventQueue::new(settings),
            registry: Mutex::new(TypeRegistry::new(settings)),
            bridge: Mutex::new(bridge),
        }
    }

    /// Convenience constructor that also creates the native
    /// notification channel, returning the producer side for the
    /// platform layer.
    pub fn with_channel(
        settings: &Settings,
        channel_cap: usize,
    ) -> (Self, crossbeam_channel::Sender<crate::pump::NativeNotification>) {
        let (sender, bridge) = PumpBridge::channel(channel_cap);
        (Self::new(settings, bridge), sender)
    }

    /// Drains pending native notifications into the queue. Owner
    /// thread only. Returns how many events were accepted.
    pub fn pump(&self) -> usize {
        self.lock_bridge().pump(&self.queue)
    }

    /// Removes and returns matching events, pumping first when asked.
    pub fn get(
        &self,
        selector: Option<Selector>,
        exclude: Option<Selector>,
        do_pump: bool,
    ) -> Result<Vec<Event>, UsageError> {
        if do_pump {
            self.pump();
        }
        self.queue.get(selector, exclude)
    }

    /// Oldest event or the no-event sentinel; never blocks.
    pub fn poll(&self, do_pump: bool) -> Event {
        if do_pump {
            self.pump();
        }
        self.queue.poll()
    }

    /// Oldest event, blocking until one arrives or `timeout` elapses.
    ///
    /// The pump runs once up front; while suspended, arrivals come from
    /// `post` on other threads.
    pub fn wait(&self, timeout: Option<Duration>, do_pump: bool) -> Event {
        if do_pump {
            self.pump();
        }
        self.queue.wait(timeout)
    }

    pub fn peek(&self, selector: Option<Selector>, do_pump: bool) -> bool {
        if do_pump {
            self.pump();
        }
        self.queue.peek(selector)
    }

    pub fn clear(
        &self,
        selector: Option<Selector>,
        exclude: Option<Selector>,
        do_pump: bool,
    ) -> Result<(), UsageError> {
        if do_pump {
            self.pump();
        }
        self.queue.clear(selector, exclude)
    }

    /// Appends an application event; same admission and capacity rules
    /// as pumped events. Any thread.
    pub fn post(&self, event: Event) -> bool {
        self.queue.post(event)
    }

    /// Reserves a fresh application-defined event kind.
    pub fn custom_type(&self) -> Result<u32, RegistryError> {
        self.lock_registry().allocate_custom()
    }

    /// Human-readable name for a kind.
    pub fn event_name(&self, kind: u32) -> &'static str {
        self.lock_registry().name_of(kind)
    }

    pub fn is_reserved(&self, kind: u32) -> bool {
        self.lock_registry().is_reserved(kind)
    }

    pub fn set_blocked(&self, selector: impl Into<Selector>) {
        self.queue.set_blocked(selector);
    }

    pub fn set_allowed(&self, selector: impl Into<Selector>) {
        self.queue.set_allowed(selector);
    }

    pub fn is_blocked(&self, selector: impl Into<Selector>) -> bool {
        self.queue.is_blocked(selector)
    }

    pub fn blocked_kinds(&self) -> Vec<u32> {
        self.queue.blocked_kinds()
    }

    pub fn set_grab(&self, grabbed: bool) {
        self.queue.set_grab(grabbed);
    }

    pub fn get_grab(&self) -> bool {
        self.queue.get_grab()
    }

    /// Clone of the queue handle for producers on other threads.
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    fn lock_registry(&self) -> MutexGuard<'_, TypeRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_bridge(&self) -> MutexGuard<'_, PumpBridge> {
        self.bridge.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pump::NativeNotification;
    use crate::registry;

    fn system() -> (EventSystem, crossbeam_channel::Sender<NativeNotification>) {
        EventSystem::with_channel(&Settings::default(), 64)
    }

    #[test]
    fn drains_pump_before_reading_when_asked() {
        let (system, sender) = system();
        sender.send(NativeNotification::Quit).unwrap();

        // Without pumping the queue still looks empty.
        assert!(!system.peek(None, false));
        // With pumping the notification shows up.
        assert!(system.peek(None, true));
        assert_eq!(system.poll(false).kind(), registry::QUIT);
    }

    #[test]
    fn custom_type_and_event_name_round_trip() {
        let (system, _sender) = system();
        let kind = system.custom_type().unwrap();
        assert!(kind >= Settings::default().reserved_end);
        assert_eq!(system.event_name(kind), "UserEvent");
        assert_eq!(system.event_name(registry::QUIT), "Quit");
        assert!(!system.is_reserved(kind));
    }

    #[test]
    fn custom_types_are_strictly_increasing() {
        let (system, _sender) = system();
        let kinds: Vec<u32> = (0..5).map(|_| system.custom_type().unwrap()).collect();
        assert!(kinds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn posted_custom_events_flow_through() {
        let (system, _sender) = system();
        let kind = system.custom_type().unwrap();
        assert!(system.post(Event::with_attrs(kind, [("payload", "hello")])));

        let events = system.get(Some(Selector::One(kind)), None, false).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), kind);
    }

    #[test]
    fn filter_surface_delegates_to_the_queue() {
        let (system, _sender) = system();
        system.set_blocked([registry::MOUSE_MOTION, registry::KEY_UP]);
        assert!(system.is_blocked(registry::KEY_UP));
        assert_eq!(
            system.blocked_kinds(),
            vec![registry::KEY_UP, registry::MOUSE_MOTION]
        );

        system.set_allowed(Selector::All);
        assert!(system.blocked_kinds().is_empty());
    }

    #[test]
    fn grab_is_advisory_state() {
        let (system, _sender) = system();
        system.set_grab(true);
        assert!(system.get_grab());
    }
}
