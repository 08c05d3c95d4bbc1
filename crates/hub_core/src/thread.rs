//! Grouping of open notifications into threads.
//!
//! Notifications that share a [`ThreadKey`] are presented as a single entry. The registry keeps
//! the forward `key -> thread` map and the reverse `id -> key` index in lockstep; every mutation
//! goes through a method that updates both.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::NotificationRequest;

/// The key notifications are grouped by.
#[repr(transparent)]
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, derive_more::AsRef, derive_more::From, derive_more::Display)]
pub struct ThreadKey(pub String);

impl std::borrow::Borrow<str> for ThreadKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ThreadKey {
    fn from(s: &str) -> Self {
        ThreadKey(s.to_owned())
    }
}

impl ThreadKey {
    /// The `desktop-entry` hint if present and non-empty, else the application name.
    pub fn for_request(request: &NotificationRequest) -> ThreadKey {
        ThreadKey(request.desktop_entry().unwrap_or(&request.app_name).to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Derive the display label of a thread from its latest notification.
///
/// Callers that only fill in the body tend to repeat the application name as the summary, so if
/// the summary is the thread key or the application name, the (truncated) body is used instead.
pub fn label_for(key: &ThreadKey, app_name: &str, summary: &str, body: &str, max_body_chars: usize) -> String {
    if summary == key.as_str() || summary == app_name {
        format!("{}: {}", key, truncate_chars(body, max_body_chars))
    } else {
        format!("{}: {}", key, summary)
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", s[..cut].trim_end()),
        None => s.to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Thread {
    label: String,
    members: BTreeSet<u32>,
}

/// A copy of one thread's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSnapshot {
    pub key: ThreadKey,
    pub label: String,
    pub members: Vec<u32>,
}

/// What a single registry mutation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadDelta {
    /// The thread that was inserted into, if any.
    pub key: Option<ThreadKey>,
    /// Whether `key` was created by this mutation.
    pub created: bool,
    /// The label `key` carries after the mutation.
    pub label: Option<String>,
    pub added: Vec<u32>,
    pub removed: Vec<u32>,
    /// Threads whose member set became empty and that were deleted.
    pub cleared: Vec<ThreadKey>,
}

#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: HashMap<ThreadKey, Thread>,
    thread_of: HashMap<u32, ThreadKey>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` into the thread `key`, creating the thread if necessary, and set the label of
    /// that thread to `label`.
    ///
    /// If `replaces` names another member of the thread `key`, it is removed once `id` is in, so
    /// the thread survives the supersession. `id` itself is moved out of any other thread it
    /// currently belongs to, so an identifier is never a member of two threads.
    pub fn upsert(&mut self, key: ThreadKey, id: u32, label: String, replaces: Option<u32>) -> ThreadDelta {
        let mut delta = ThreadDelta::default();

        if self.thread_of.get(&id).is_some_and(|current| *current != key) {
            self.detach(id, &mut delta);
        }

        let created = !self.threads.contains_key(&key);
        let thread = self.threads.entry(key.clone()).or_insert_with(|| Thread { label: String::new(), members: BTreeSet::new() });
        thread.label = label.clone();
        if thread.members.insert(id) {
            delta.added.push(id);
        }
        self.thread_of.insert(id, key.clone());

        let superseded = replaces.filter(|old| *old != id && self.thread_of.get(old) == Some(&key));
        if let Some(old) = superseded {
            self.detach(old, &mut delta);
        }

        delta.key = Some(key);
        delta.created = created;
        delta.label = Some(label);
        delta
    }

    /// Remove `id` from whatever thread it is a member of, deleting that thread if it becomes
    /// empty. Untracked identifiers are ignored.
    pub fn remove(&mut self, id: u32) -> ThreadDelta {
        let mut delta = ThreadDelta::default();
        self.detach(id, &mut delta);
        delta
    }

    fn detach(&mut self, id: u32, delta: &mut ThreadDelta) {
        let Some(key) = self.thread_of.remove(&id) else {
            return;
        };
        let now_empty = match self.threads.get_mut(&key) {
            Some(thread) => {
                thread.members.remove(&id);
                thread.members.is_empty()
            }
            None => {
                log::error!("Notification {} was indexed under missing thread {}", id, key);
                false
            }
        };
        delta.removed.push(id);
        if now_empty {
            self.threads.remove(&key);
            delta.cleared.push(key);
        }
    }

    pub fn thread_of(&self, id: u32) -> Option<&ThreadKey> {
        self.thread_of.get(&id)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.threads.get(key).map(|thread| thread.label.as_str())
    }

    /// Members of the thread `key`, in ascending order.
    pub fn members(&self, key: &str) -> Option<Vec<u32>> {
        self.threads.get(key).map(|thread| thread.members.iter().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// All threads, ordered by key.
    pub fn snapshot(&self) -> Vec<ThreadSnapshot> {
        let sorted: BTreeMap<_, _> = self.threads.iter().collect();
        sorted
            .into_iter()
            .map(|(key, thread)| ThreadSnapshot {
                key: key.clone(),
                label: thread.label.clone(),
                members: thread.members.iter().copied().collect(),
            })
            .collect()
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let indexed: usize = self.threads.values().map(|thread| thread.members.len()).sum();
        assert_eq!(indexed, self.thread_of.len());
        for (key, thread) in &self.threads {
            assert!(!thread.members.is_empty(), "thread {} is empty", key);
            for id in &thread.members {
                assert_eq!(Some(key), self.thread_of.get(id));
            }
        }
    }
}
