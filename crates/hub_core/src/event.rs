use crate::{CloseReason, ThreadKey};

/// Attention state of the tray entry that represents all threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Status {
    /// Nothing to show.
    Passive,
    /// There are open notifications the user has already been alerted to.
    Active,
    /// A new thread appeared since the tray was last looked at.
    NeedsAttention,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The set of open notifications changed; carries the new count.
    Changed { count: u32 },
    NotificationClosed { id: u32, reason: CloseReason },
    ActionInvoked { id: u32, action_key: String },
    ThreadOpened { key: ThreadKey, label: String },
    ThreadRelabeled { key: ThreadKey, label: String },
    ThreadCleared { key: ThreadKey },
    TrayStatus(Status),
}

/// Receiver of the events a session produces.
///
/// `emit` is called while the session state is locked, so implementations must return promptly and
/// must not call back into the session.
pub trait EventSink: Send {
    fn emit(&self, event: Event);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

impl EventSink for std::sync::mpsc::Sender<Event> {
    fn emit(&self, event: Event) {
        if let Err(e) = self.send(event) {
            log::debug!("Dropping event, receiver is gone: {:?}", e.0);
        }
    }
}
