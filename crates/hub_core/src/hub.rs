use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    thread::ThreadSnapshot, CloseReason, Notification, NotificationRequest, NotificationSession, NotificationSummary, NotifyOutcome,
    Result, Status,
};

/// A cloneable, thread-safe handle to a [`NotificationSession`].
///
/// Every operation, reads included, runs under one lock, so no caller ever observes a partially
/// applied mutation. This is a std mutex rather than tokio's: it is never held across an await.
#[derive(Debug, Clone)]
pub struct Hub {
    session: Arc<Mutex<NotificationSession>>,
}

impl Hub {
    pub fn new(session: NotificationSession) -> Self {
        Self { session: Arc::new(Mutex::new(session)) }
    }

    fn lock(&self) -> MutexGuard<'_, NotificationSession> {
        // every mutation either completes or leaves the session untouched, so a poisoned lock
        // still guards consistent state
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notify(&self, request: NotificationRequest) -> Result<NotifyOutcome> {
        self.lock().notify(request)
    }

    pub fn close(&self, id: u32, reason: CloseReason) -> Option<Notification> {
        self.lock().close(id, reason)
    }

    pub fn invoke_action(&self, id: u32, action_key: &str) -> bool {
        self.lock().invoke_action(id, action_key)
    }

    pub fn acknowledge(&self) {
        self.lock().acknowledge()
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn list(&self) -> Vec<NotificationSummary> {
        self.lock().list()
    }

    pub fn get(&self, id: u32) -> Option<Notification> {
        self.lock().get(id).cloned()
    }

    pub fn threads(&self) -> Vec<ThreadSnapshot> {
        self.lock().threads()
    }

    pub fn status(&self) -> Status {
        self.lock().status()
    }
}
