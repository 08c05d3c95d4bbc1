use std::{collections::HashMap, time::Duration};

use hub_core::{Action, CloseReason, Disposition, Hub, NotificationRequest};
use zbus::{interface, zvariant::OwnedValue};

use crate::{config::HubConfig, expiry::ExpiryHandle};

pub const SERVER_NAME: &str = "notification-hub";
pub const SERVER_VENDOR: &str = "xi";
pub const SPEC_VERSION: &str = "1.2";

/// An instance of `org.freedesktop.Notifications`. All state lives in the [`Hub`]; this only
/// translates between the wire and the core, and arms expiry timers.
#[derive(Debug)]
pub struct NotificationServer {
    hub: Hub,
    expiry: ExpiryHandle,
    capabilities: Vec<String>,
    default_timeout: Option<Duration>,
}

impl NotificationServer {
    pub fn new(hub: Hub, expiry: ExpiryHandle, config: &HubConfig) -> Self {
        Self {
            hub,
            expiry,
            capabilities: config.capabilities.clone(),
            default_timeout: config.default_timeout_ms.map(Duration::from_millis),
        }
    }

    /// How long a notification that asked for `expire_timeout` stays open, `None` for forever.
    fn expiry_for(&self, expire_timeout: i32) -> Option<Duration> {
        match expire_timeout {
            0 => None,
            ms if ms > 0 => Some(Duration::from_millis(u64::from(ms.unsigned_abs()))),
            _ => self.default_timeout,
        }
    }

    /// Hand `request` to the hub and arm, re-arm or disarm the expiry timer of the resulting
    /// notification. Suppressed requests never get a timer.
    fn submit(&self, request: NotificationRequest) -> zbus::fdo::Result<u32> {
        let expire_timeout = request.expire_timeout;
        let outcome = self.hub.notify(request).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))?;
        if outcome.disposition != Disposition::Suppressed {
            match self.expiry_for(expire_timeout) {
                Some(after) => self.expiry.schedule(outcome.id, after),
                None => self.expiry.cancel(outcome.id),
            }
        }
        Ok(outcome.id)
    }

    fn close(&self, id: u32, reason: CloseReason) {
        self.expiry.cancel(id);
        self.hub.close(id, reason);
    }
}

/// Methods correspond to methods of the freedesktop notification protocol, followed by the
/// extension methods used by `notification-hub` clients. Signals are emitted from
/// [`crate::events::run_dispatcher`].
#[interface(name = "org.freedesktop.Notifications")]
impl NotificationServer {
    /// GetCapabilities method
    fn get_capabilities(&self) -> Vec<String> {
        self.capabilities.clone()
    }

    /// Notify method
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        actions: Vec<String>,
        hints: HashMap<String, OwnedValue>,
        expire_timeout: i32,
        #[zbus(header)] hdr: zbus::message::Header<'_>,
    ) -> zbus::fdo::Result<u32> {
        let request = NotificationRequest {
            sender: hdr.sender().map(|sender| sender.to_string()).unwrap_or_default(),
            app_name,
            replaces_id,
            app_icon,
            summary,
            body,
            actions: Action::from_flat_list(&actions),
            hints: hints.iter().map(|(key, value)| (key.clone(), super::hint_value(value))).collect(),
            expire_timeout,
        };
        log::debug!("Notify from {:?}: {:?} (replaces {})", request.sender, request.summary, request.replaces_id);
        self.submit(request)
    }

    /// CloseNotification method
    fn close_notification(&self, id: u32) {
        self.close(id, CloseReason::ClosedByCall);
    }

    /// GetServerInformation method
    #[zbus(out_args("name", "vendor", "version", "spec_version"))]
    fn get_server_information(&self) -> (String, String, String, String) {
        (SERVER_NAME.to_owned(), SERVER_VENDOR.to_owned(), env!("CARGO_PKG_VERSION").to_owned(), SPEC_VERSION.to_owned())
    }

    /// NotificationClosed signal
    #[zbus(signal)]
    pub async fn notification_closed(ctxt: &zbus::SignalContext<'_>, id: u32, reason: u32) -> zbus::Result<()>;

    /// ActionInvoked signal
    #[zbus(signal)]
    pub async fn action_invoked(ctxt: &zbus::SignalContext<'_>, id: u32, action_key: &str) -> zbus::Result<()>;

    // ------------------------------------------------------------------------

    /// CountNotifications method
    fn count_notifications(&self) -> u32 {
        u32::try_from(self.hub.count()).unwrap_or(u32::MAX)
    }

    /// GetNotifications method, returning `(id, app_name, summary, unix timestamp)` for every open
    /// notification, ordered by id.
    fn get_notifications(&self) -> Vec<(u32, String, String, i64)> {
        self.hub.list().into_iter().map(|n| (n.id, n.app_name, n.summary, n.timestamp.timestamp())).collect()
    }

    /// DeleteNotification method
    fn delete_notification(&self, id: u32) {
        self.close(id, CloseReason::Dismissed);
    }

    /// InvokeAction method
    fn invoke_action(&self, id: u32, action_key: &str) -> bool {
        let invoked = self.hub.invoke_action(id, action_key);
        if invoked && self.hub.get(id).is_none() {
            self.expiry.cancel(id);
        }
        invoked
    }

    /// Acknowledge method
    fn acknowledge(&self) {
        self.hub.acknowledge();
    }

    /// Changed signal
    #[zbus(signal)]
    pub async fn changed(ctxt: &zbus::SignalContext<'_>, count: u32) -> zbus::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::ExpiryCommand;
    use hub_core::{NotificationSession, NullSink, Rule, RuleSet};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn server(default_timeout_ms: Option<u64>) -> NotificationServer {
        let hub = Hub::new(NotificationSession::new(RuleSet::default(), Box::new(NullSink)));
        let config = HubConfig { default_timeout_ms, ..Default::default() };
        NotificationServer::new(hub, ExpiryHandle::detached(), &config)
    }

    fn recording_server(rules: Vec<Rule>) -> (NotificationServer, UnboundedReceiver<ExpiryCommand>) {
        let hub = Hub::new(NotificationSession::new(RuleSet::new(rules), Box::new(NullSink)));
        let config = HubConfig { default_timeout_ms: Some(5000), ..Default::default() };
        let (expiry, commands) = ExpiryHandle::channel();
        (NotificationServer::new(hub, expiry, &config), commands)
    }

    fn drain(commands: &mut UnboundedReceiver<ExpiryCommand>) -> Vec<ExpiryCommand> {
        let mut received = Vec::new();
        while let Ok(command) = commands.try_recv() {
            received.push(command);
        }
        received
    }

    fn request(app_name: &str, replaces_id: u32, expire_timeout: i32) -> NotificationRequest {
        NotificationRequest { replaces_id, expire_timeout, ..NotificationRequest::new(app_name, "hi", "") }
    }

    #[test]
    fn test_submit_arms_expiry() {
        let (s, mut commands) = recording_server(vec![]);

        assert_eq!(1, s.submit(request("Chat", 0, 1500)).unwrap());
        assert_eq!(vec![ExpiryCommand::Schedule { id: 1, after: Duration::from_millis(1500) }], drain(&mut commands));

        assert_eq!(2, s.submit(request("Chat", 0, -1)).unwrap());
        assert_eq!(vec![ExpiryCommand::Schedule { id: 2, after: Duration::from_millis(5000) }], drain(&mut commands));

        // an update re-arms the timer of the notification it replaces
        assert_eq!(1, s.submit(request("Chat", 1, 3000)).unwrap());
        assert_eq!(vec![ExpiryCommand::Schedule { id: 1, after: Duration::from_millis(3000) }], drain(&mut commands));

        assert_eq!(1, s.submit(request("Chat", 1, 0)).unwrap());
        assert_eq!(vec![ExpiryCommand::Cancel { id: 1 }], drain(&mut commands));
    }

    #[test]
    fn test_submit_suppressed_has_no_timer() {
        let (s, mut commands) = recording_server(vec![Rule::app_name("Spammer")]);
        assert!(s.submit(request("Spammer", 0, 1500)).is_ok());
        assert_eq!(Vec::<ExpiryCommand>::new(), drain(&mut commands));
        assert_eq!(0, s.count_notifications());
    }

    #[test]
    fn test_close_disarms_expiry() {
        let (s, mut commands) = recording_server(vec![]);
        let id = s.submit(request("Chat", 0, 1500)).unwrap();
        drain(&mut commands);

        s.close_notification(id);
        assert_eq!(vec![ExpiryCommand::Cancel { id }], drain(&mut commands));
        assert_eq!(0, s.count_notifications());
    }

    #[test]
    fn test_expiry_for() {
        let s = server(Some(5000));
        assert_eq!(None, s.expiry_for(0));
        assert_eq!(Some(Duration::from_millis(1500)), s.expiry_for(1500));
        assert_eq!(Some(Duration::from_millis(5000)), s.expiry_for(-1));
        assert_eq!(Some(Duration::from_millis(5000)), s.expiry_for(-20));
        assert_eq!(None, server(None).expiry_for(-1));
    }

    #[test]
    fn test_server_information() {
        let (name, vendor, _, spec) = server(None).get_server_information();
        assert_eq!(("notification-hub", "xi", "1.2"), (name.as_str(), vendor.as_str(), spec.as_str()));
    }
}
