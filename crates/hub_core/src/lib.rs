//! The notification session and grouping engine behind `notification-hub`.
//!
//! Everything in here is transport agnostic: a D-Bus (or any other) front end decodes incoming
//! calls into [`NotificationRequest`]s, hands them to a [`Hub`], and forwards the [`Event`]s that
//! come out of the configured [`EventSink`].

mod error;
pub use error::*;

mod event;
pub use event::*;

mod hub;
pub use hub::*;

mod id;
pub use id::*;

mod request;
pub use request::*;

pub mod rules;
pub use rules::{Rule, RuleSet};

mod session;
pub use session::*;

pub mod thread;
pub use thread::{ThreadDelta, ThreadKey, ThreadRegistry, ThreadSnapshot};
