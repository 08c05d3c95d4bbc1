use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Hint carrying the basename of the sending application's `.desktop` file.
pub const HINT_DESKTOP_ENTRY: &str = "desktop-entry";

/// Hint asking the server to keep the notification open after one of its actions was invoked.
pub const HINT_RESIDENT: &str = "resident";

/// The value of a single hint, narrowed to the shapes that can be compared against configured rules.
///
/// All integer types of the wire format are widened into [`HintValue::Int`]. Anything that doesn't
/// fit one of the comparable shapes (image data, arrays, ...) becomes [`HintValue::Other`], which
/// is never equal to anything, not even another `Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    #[serde(skip)]
    Other,
}

impl PartialEq for HintValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HintValue::Bool(a), HintValue::Bool(b)) => a == b,
            (HintValue::Int(a), HintValue::Int(b)) => a == b,
            (HintValue::Double(a), HintValue::Double(b)) => a == b,
            (HintValue::Str(a), HintValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl HintValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HintValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for HintValue {
    fn from(s: &str) -> Self {
        HintValue::Str(s.to_owned())
    }
}

impl From<String> for HintValue {
    fn from(s: String) -> Self {
        HintValue::Str(s)
    }
}

impl From<bool> for HintValue {
    fn from(b: bool) -> Self {
        HintValue::Bool(b)
    }
}

impl From<i64> for HintValue {
    fn from(n: i64) -> Self {
        HintValue::Int(n)
    }
}

/// A single action a notification offers, as an `(action_key, label)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub key: String,
    pub label: String,
}

impl Action {
    /// Build the action list from the flat `[key, label, key, label, ...]` form used on the wire.
    /// A trailing key without a label is dropped.
    pub fn from_flat_list<S: AsRef<str>>(flat: &[S]) -> Vec<Action> {
        flat.chunks_exact(2).map(|pair| Action { key: pair[0].as_ref().to_owned(), label: pair[1].as_ref().to_owned() }).collect()
    }
}

/// A decoded `Notify` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationRequest {
    /// Unique bus name (or other transport identity) of the caller.
    pub sender: String,
    pub app_name: String,
    /// Identifier of a notification this request should update, 0 for a new one.
    pub replaces_id: u32,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<Action>,
    pub hints: HashMap<String, HintValue>,
    /// Requested expiry in milliseconds; -1 is "server default", 0 is "never".
    pub expire_timeout: i32,
}

impl NotificationRequest {
    pub fn new(app_name: impl Into<String>, summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self { app_name: app_name.into(), summary: summary.into(), body: body.into(), expire_timeout: -1, ..Default::default() }
    }

    pub fn replacing(mut self, id: u32) -> Self {
        self.replaces_id = id;
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<HintValue>) -> Self {
        self.hints.insert(key.into(), value.into());
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// The `desktop-entry` hint, if present, a string, and non-empty.
    pub fn desktop_entry(&self) -> Option<&str> {
        self.hints.get(HINT_DESKTOP_ENTRY).and_then(HintValue::as_str).filter(|entry| !entry.is_empty())
    }
}

/// Why a notification was closed, with the numeric values of the `NotificationClosed` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum CloseReason {
    #[display("expired")]
    Expired = 1,
    #[display("dismissed by the user")]
    Dismissed = 2,
    #[display("closed by a call to CloseNotification")]
    ClosedByCall = 3,
    #[display("undefined")]
    Undefined = 4,
}

impl CloseReason {
    pub fn code(self) -> u32 {
        self as u32
    }
}
