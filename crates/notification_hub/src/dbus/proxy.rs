use std::collections::HashMap;

use zbus::zvariant::Value;

/// Client side of [`super::NotificationServer`], including the extension methods.
#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications",
    gen_blocking = false
)]
pub trait Notifications {
    fn get_capabilities(&self) -> zbus::Result<Vec<String>>;

    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    fn get_server_information(&self) -> zbus::Result<(String, String, String, String)>;

    fn count_notifications(&self) -> zbus::Result<u32>;

    fn get_notifications(&self) -> zbus::Result<Vec<(u32, String, String, i64)>>;

    fn delete_notification(&self, id: u32) -> zbus::Result<()>;

    fn invoke_action(&self, id: u32, action_key: &str) -> zbus::Result<bool>;

    fn acknowledge(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn changed(&self, count: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn action_invoked(&self, id: u32, action_key: &str) -> zbus::Result<()>;
}
