use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use crate::{
    thread::{label_for, ThreadDelta, ThreadKey, ThreadRegistry, ThreadSnapshot},
    Action, CloseReason, Event, EventSink, HintValue, IdAllocator, NotificationRequest, Result, RuleSet, Status, HINT_RESIDENT,
};

/// Default number of body characters that make it into a thread label.
pub const DEFAULT_LABEL_BODY_LENGTH: usize = 40;

/// An open notification, as tracked by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u32,
    pub sender: String,
    pub app_name: String,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<Action>,
    pub hints: HashMap<String, HintValue>,
    pub expire_timeout: i32,
    pub thread: ThreadKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub close_reason: Option<CloseReason>,
}

impl Notification {
    fn from_request(id: u32, request: NotificationRequest, thread: ThreadKey, now: DateTime<Utc>) -> Self {
        let NotificationRequest { sender, app_name, replaces_id: _, app_icon, summary, body, actions, hints, expire_timeout } = request;
        Notification {
            id,
            sender,
            app_name,
            app_icon,
            summary,
            body,
            actions,
            hints,
            expire_timeout,
            thread,
            created_at: now,
            updated_at: now,
            close_reason: None,
        }
    }

    fn update_from(&mut self, request: NotificationRequest, thread: ThreadKey, now: DateTime<Utc>) {
        let created_at = self.created_at;
        *self = Notification { created_at, ..Notification::from_request(self.id, request, thread, now) };
    }

    pub fn is_resident(&self) -> bool {
        self.hints.get(HINT_RESIDENT) == Some(&HintValue::Bool(true))
    }

    pub fn summary(&self) -> NotificationSummary {
        NotificationSummary { id: self.id, app_name: self.app_name.clone(), summary: self.summary.clone(), timestamp: self.updated_at }
    }
}

/// The short form of a notification returned by [`NotificationSession::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSummary {
    pub id: u32,
    pub app_name: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A new notification was opened.
    Created,
    /// An open notification was updated in place.
    Updated,
    /// The request matched an ignore rule. The identifier is valid but inert.
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub id: u32,
    pub disposition: Disposition,
}

/// Owns all notification state: the identifier space, the open notifications and their grouping.
///
/// Every method takes the state from one consistent point to the next and reports what changed
/// to the [`EventSink`]. Use [`crate::Hub`] to share a session between threads.
pub struct NotificationSession {
    ids: IdAllocator,
    rules: RuleSet,
    threads: ThreadRegistry,
    open: BTreeMap<u32, Notification>,
    sink: Box<dyn EventSink>,
    label_body_length: usize,
    needs_attention: bool,
    status: Status,
}

impl std::fmt::Debug for NotificationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSession")
            .field("ids", &self.ids)
            .field("rules", &self.rules)
            .field("threads", &self.threads)
            .field("open", &self.open)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl NotificationSession {
    pub fn new(rules: RuleSet, sink: Box<dyn EventSink>) -> Self {
        Self::from_parts(IdAllocator::new(), ThreadRegistry::new(), rules, sink)
    }

    pub fn from_parts(ids: IdAllocator, threads: ThreadRegistry, rules: RuleSet, sink: Box<dyn EventSink>) -> Self {
        Self {
            ids,
            rules,
            threads,
            open: BTreeMap::new(),
            sink,
            label_body_length: DEFAULT_LABEL_BODY_LENGTH,
            needs_attention: false,
            status: Status::Passive,
        }
    }

    pub fn with_label_body_length(mut self, max_chars: usize) -> Self {
        self.label_body_length = max_chars;
        self
    }

    /// Handle a `Notify` request. Always yields a usable identifier, even for suppressed requests.
    pub fn notify(&mut self, request: NotificationRequest) -> Result<NotifyOutcome> {
        if self.rules.matches(&request) {
            let id = self.ids.next()?;
            log::debug!("Suppressed notification {} from {:?}: {:?}", id, request.app_name, request.summary);
            return Ok(NotifyOutcome { id, disposition: Disposition::Suppressed });
        }

        let key = ThreadKey::for_request(&request);
        let label = label_for(&key, &request.app_name, &request.summary, &request.body, self.label_body_length);
        let now = Utc::now();

        // identifiers start at 1, so a replaces_id of 0 never names an open notification
        let outcome = match self.open.get_mut(&request.replaces_id) {
            Some(existing) => {
                let id = existing.id;
                log::debug!("Updating notification {} in place", id);
                existing.update_from(request, key.clone(), now);
                NotifyOutcome { id, disposition: Disposition::Updated }
            }
            None => {
                if request.replaces_id != 0 {
                    log::debug!("Notification {} to be replaced is not open, opening a new one", request.replaces_id);
                }
                let id = self.ids.next()?;
                self.open.insert(id, Notification::from_request(id, request, key.clone(), now));
                NotifyOutcome { id, disposition: Disposition::Created }
            }
        };

        let replaces = (outcome.disposition == Disposition::Updated).then_some(outcome.id);
        let delta = self.threads.upsert(key, outcome.id, label, replaces);
        self.publish_thread_delta(delta);
        self.emit(Event::Changed { count: self.count_u32() });
        self.sync_status();

        Ok(outcome)
    }

    /// Close an open notification. Closing an identifier that isn't open does nothing.
    /// Returns the closed notification, with its close reason set.
    pub fn close(&mut self, id: u32, reason: CloseReason) -> Option<Notification> {
        let Some(mut notification) = self.open.remove(&id) else {
            log::debug!("Ignoring close of notification {}, it is not open", id);
            return None;
        };
        notification.close_reason = Some(reason);
        log::debug!("Closed notification {} ({})", id, reason);

        let delta = self.threads.remove(id);
        self.publish_thread_delta(delta);
        self.emit(Event::NotificationClosed { id, reason });
        self.emit(Event::Changed { count: self.count_u32() });
        self.sync_status();

        Some(notification)
    }

    /// Deliver `action_key` of notification `id`. Unless the notification is resident, it is
    /// dismissed afterwards. Returns whether the action was delivered.
    pub fn invoke_action(&mut self, id: u32, action_key: &str) -> bool {
        let Some(notification) = self.open.get(&id) else {
            return false;
        };
        if !notification.actions.iter().any(|action| action.key == action_key) {
            log::debug!("Notification {} has no action {:?}", id, action_key);
            return false;
        }
        let resident = notification.is_resident();

        self.emit(Event::ActionInvoked { id, action_key: action_key.to_owned() });
        if !resident {
            self.close(id, CloseReason::Dismissed);
        }
        true
    }

    /// Mark all threads as seen, moving the tray out of the attention state.
    pub fn acknowledge(&mut self) {
        self.needs_attention = false;
        self.sync_status();
    }

    pub fn count(&self) -> usize {
        self.open.len()
    }

    /// Open notifications ordered by identifier.
    pub fn list(&self) -> Vec<NotificationSummary> {
        self.open.values().map(Notification::summary).collect()
    }

    pub fn get(&self, id: u32) -> Option<&Notification> {
        self.open.get(&id)
    }

    pub fn threads(&self) -> Vec<ThreadSnapshot> {
        self.threads.snapshot()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    fn publish_thread_delta(&mut self, delta: ThreadDelta) {
        for key in delta.cleared {
            log::debug!("Thread {} cleared", key);
            self.emit(Event::ThreadCleared { key });
        }
        if let (Some(key), Some(label)) = (delta.key, delta.label) {
            if delta.created {
                self.needs_attention = true;
                self.emit(Event::ThreadOpened { key, label });
            } else {
                self.emit(Event::ThreadRelabeled { key, label });
            }
        }
    }

    fn sync_status(&mut self) {
        let status = if self.threads.is_empty() {
            self.needs_attention = false;
            Status::Passive
        } else if self.needs_attention {
            Status::NeedsAttention
        } else {
            Status::Active
        };
        if status != self.status {
            self.status = status;
            self.emit(Event::TrayStatus(status));
        }
    }

    fn count_u32(&self) -> u32 {
        u32::try_from(self.open.len()).unwrap_or(u32::MAX)
    }

    fn emit(&self, event: Event) {
        self.sink.emit(event);
    }
}
