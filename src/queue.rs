//! The bounded event queue.
//!
//! One mutex guards the buffer, the admission filter and the grab flag;
//! a condvar signaled on every successful enqueue backs [`EventQueue::wait`].
//! The handle is cheap to clone, so producers on any thread can `post`
//! while the owner thread drains. Draining operations (`poll`, `wait`,
//! `get`, `peek`, `clear`) are part of the single-owner-thread contract:
//! the design assumes one consumer and does not define multi-consumer
//! ordering.
//!
//! Overflow policy is drop-newest: a post against a full queue returns
//! `false` and the queued events are untouched. Blocked-kind posts are
//! rejected the same way. Neither is an error; both are steady-state
//! outcomes of a polling loop.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::UsageError;
use crate::event::Event;
use crate::filter::{AdmissionFilter, Selector};

struct Inner {
    buffer: VecDeque<Event>,
    filter: AdmissionFilter,
    grabbed: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    available: Condvar,
    capacity: usize,
}

/// Handle to a bounded, admission-filtered FIFO of [`Event`]s.
#[derive(Clone)]
pub struct EventQueue {
    shared: Arc<Shared>,
}

impl EventQueue {
    pub fn new(settings: &Settings) -> Self {
        info!(
            "Event queue up: capacity {}, kind ceiling {}",
            settings.capacity, settings.ceiling
        );
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    buffer: VecDeque::with_capacity(settings.capacity),
                    filter: AdmissionFilter::new(settings.ceiling),
                    grabbed: false,
                }),
                available: Condvar::new(),
                capacity: settings.capacity,
            }),
        }
    }

    /// Appends an event to the tail. Returns `false` without enqueuing
    /// when the kind is blocked or the queue is full. Never blocks;
    /// callable from any thread.
    pub fn post(&self, event: Event) -> bool {
        let mut inner = self.lock();
        if inner.filter.is_blocked_kind(event.kind()) {
            debug!("Rejected event of blocked kind {}", event.kind());
            return false;
        }
        if inner.buffer.len() >= self.shared.capacity {
            debug!(
                "Queue full ({} events), dropping incoming kind {}",
                self.shared.capacity,
                event.kind()
            );
            return false;
        }
        inner.buffer.push_back(event);
        drop(inner);
        self.shared.available.notify_one();
        true
    }

    /// Removes and returns the oldest event, or the no-event sentinel
    /// when the queue is empty. Never blocks.
    pub fn poll(&self) -> Event {
        self.lock().buffer.pop_front().unwrap_or_else(Event::none)
    }

    /// Like [`poll`](Self::poll) when the queue is non-empty; otherwise
    /// suspends on the condvar until an enqueue signals or the timeout
    /// elapses. `None` waits indefinitely. Timing out yields the
    /// no-event sentinel; the timeout is the only cancellation path.
    pub fn wait(&self, timeout: Option<Duration>) -> Event {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut inner = self.lock();
        loop {
            if let Some(event) = inner.buffer.pop_front() {
                return event;
            }
            // Spurious wakeups loop back to the emptiness check.
            match deadline {
                None => {
                    inner = self
                        .shared
                        .available
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Event::none();
                    }
                    inner = self
                        .shared
                        .available
                        .wait_timeout(inner, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }

    /// Removes and returns, oldest first, every event matching
    /// `selector` (`None` selects all), or every event NOT matching
    /// `exclude`. Supplying both is a usage error.
    pub fn get(
        &self,
        selector: Option<Selector>,
        exclude: Option<Selector>,
    ) -> Result<Vec<Event>, UsageError> {
        let wanted = Self::selection(selector, exclude)?;
        let mut inner = self.lock();
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(inner.buffer.len());
        for event in inner.buffer.drain(..) {
            if wanted(&event) {
                taken.push(event);
            } else {
                kept.push_back(event);
            }
        }
        inner.buffer = kept;
        Ok(taken)
    }

    /// Whether any queued event matches `selector` (`None` asks whether
    /// the queue holds anything at all). Removes nothing.
    pub fn peek(&self, selector: Option<Selector>) -> bool {
        let inner = self.lock();
        match selector {
            None => !inner.buffer.is_empty(),
            Some(sel) => inner.buffer.iter().any(|e| sel.matches(e.kind())),
        }
    }

    /// [`get`](Self::get) semantics, discarding the matches instead of
    /// returning them.
    pub fn clear(
        &self,
        selector: Option<Selector>,
        exclude: Option<Selector>,
    ) -> Result<(), UsageError> {
        let wanted = Self::selection(selector, exclude)?;
        let mut inner = self.lock();
        inner.buffer.retain(|e| !wanted(e));
        Ok(())
    }

    /// Blocks the selected kinds and flushes already-queued events of
    /// those kinds, keeping the queue free of blocked-kind events.
    pub fn set_blocked(&self, selector: impl Into<Selector>) {
        let selector = selector.into();
        let mut inner = self.lock();
        inner.filter.set_blocked(&selector);
        let Inner { buffer, filter, .. } = &mut *inner;
        buffer.retain(|e| !filter.is_blocked_kind(e.kind()));
    }

    /// Re-admits the selected kinds; `Selector::All` clears the whole
    /// blocked set.
    pub fn set_allowed(&self, selector: impl Into<Selector>) {
        let selector = selector.into();
        self.lock().filter.set_allowed(&selector);
    }

    /// True if any selected kind is currently blocked.
    pub fn is_blocked(&self, selector: impl Into<Selector>) -> bool {
        self.lock().filter.is_blocked(&selector.into())
    }

    pub fn blocked_kinds(&self) -> Vec<u32> {
        self.lock().filter.blocked_kinds()
    }

    /// Advisory input-grab flag; nothing queue-internal depends on it.
    pub fn set_grab(&self, grabbed: bool) {
        debug!("Input grab set to {}", grabbed);
        self.lock().grabbed = grabbed;
    }

    pub fn get_grab(&self) -> bool {
        self.lock().grabbed
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    fn selection(
        selector: Option<Selector>,
        exclude: Option<Selector>,
    ) -> Result<impl Fn(&Event) -> bool, UsageError> {
        if selector.is_some() && exclude.is_some() {
            return Err(UsageError::ConflictingSelectors);
        }
        Ok(move |event: &Event| match (&selector, &exclude) {
            (Some(sel), None) => sel.matches(event.kind()),
            (None, Some(excl)) => !excl.matches(event.kind()),
            _ => true,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
