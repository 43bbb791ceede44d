//! Bridge between the platform's native input source and the queue.
//!
//! The platform layer owns its own threads and pushes
//! [`NativeNotification`]s into a channel; `pump` drains that channel
//! on the owner thread, translates each notification into an [`Event`]
//! with its fixed attribute set, and offers it to the queue through the
//! normal admission path. Pumping from any other thread violates the
//! owner-thread contract documented on [`EventSystem`].
//!
//! [`EventSystem`]: crate::system::EventSystem

use chrono::Local;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use crate::event::{AttrValue, Event};
use crate::queue::EventQueue;
use crate::registry;

/// A pending notification from the platform/input layer.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeNotification {
    Quit,
    Key {
        pressed: bool,
        scancode: u32,
        repeat: bool,
    },
    MouseMotion {
        x: i32,
        y: i32,
        rel_x: i32,
        rel_y: i32,
    },
    MouseButton {
        pressed: bool,
        button: u32,
        x: i32,
        y: i32,
    },
    WindowShown,
    WindowResized {
        width: u32,
        height: u32,
    },
    Focus {
        gained: bool,
    },
}

impl NativeNotification {
    /// Translates the notification into an event of the matching
    /// reserved kind, stamped with the translation time.
    pub fn into_event(self) -> Event {
        let event = match self {
            NativeNotification::Quit => Event::new(registry::QUIT),
            NativeNotification::Key {
                pressed,
                scancode,
                repeat,
            } => {
                let kind = if pressed {
                    registry::KEY_DOWN
                } else {
                    registry::KEY_UP
                };
                Event::with_attrs(
                    kind,
                    [
                        ("scancode", AttrValue::Int(scancode as i64)),
                        ("repeat", AttrValue::Bool(repeat)),
                    ],
                )
            }
            NativeNotification::MouseMotion { x, y, rel_x, rel_y } => Event::with_attrs(
                registry::MOUSE_MOTION,
                [
                    ("x", AttrValue::Int(x as i64)),
                    ("y", AttrValue::Int(y as i64)),
                    ("rel_x", AttrValue::Int(rel_x as i64)),
                    ("rel_y", AttrValue::Int(rel_y as i64)),
                ],
            ),
            NativeNotification::MouseButton {
                pressed,
                button,
                x,
                y,
            } => {
                let kind = if pressed {
                    registry::MOUSE_BUTTON_DOWN
                } else {
                    registry::MOUSE_BUTTON_UP
                };
                Event::with_attrs(
                    kind,
                    [
                        ("button", AttrValue::Int(button as i64)),
                        ("x", AttrValue::Int(x as i64)),
                        ("y", AttrValue::Int(y as i64)),
                    ],
                )
            }
            NativeNotification::WindowShown => Event::new(registry::WINDOW_SHOWN),
            NativeNotification::WindowResized { width, height } => Event::with_attrs(
                registry::WINDOW_RESIZED,
                [
                    ("width", AttrValue::Int(width as i64)),
                    ("height", AttrValue::Int(height as i64)),
                ],
            ),
            NativeNotification::Focus { gained } => {
                if gained {
                    Event::new(registry::FOCUS_GAINED)
                } else {
                    Event::new(registry::FOCUS_LOST)
                }
            }
        };
        // "timestamp" is not the reserved `type` name, so this cannot fail.
        let _ = event.set_attr("timestamp", AttrValue::Time(Local::now()));
        event
    }
}

/// Drains pending native notifications into an [`EventQueue`].
pub struct PumpBridge {
    source: Receiver<NativeNotification>,
    warned_disconnected: bool,
}

impl PumpBridge {
    /// Wraps an existing notification channel.
    pub fn new(source: Receiver<NativeNotification>) -> Self {
        Self {
            source,
            warned_disconnected: false,
        }
    }

    /// Creates a bounded notification channel and a bridge reading from
    /// it; the sender goes to the platform layer.
    pub fn channel(cap: usize) -> (Sender<NativeNotification>, Self) {
        let (sender, receiver) = bounded(cap);
        (sender, Self::new(receiver))
    }

    /// Drains every pending notification into `queue`, in arrival
    /// order, through the queue's admission path. Returns how many
    /// events the queue accepted. Never blocks.
    pub fn pump(&mut self, queue: &EventQueue) -> usize {
        let mut accepted = 0;
        loop {
            match self.source.try_recv() {
                Ok(notification) => {
                    debug!("Pumping native notification: {:?}", notification);
                    if queue.post(notification.into_event()) {
                        accepted += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.warned_disconnected {
                        warn!("Native notification source disconnected; pump is now a no-op");
                        self.warned_disconnected = true;
                    }
                    break;
                }
            }
        }
        if accepted > 0 {
            debug!("Pump delivered {} events", accepted);
        }
        accepted
    }
}
