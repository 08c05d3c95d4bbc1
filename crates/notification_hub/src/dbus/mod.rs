//! # The D-Bus side of notification-hub
//!
//! [`NotificationServer`] implements [`org.freedesktop.Notifications`] (plus a few extension
//! methods) on top of a [`hub_core::Hub`]; [`NotificationsProxy`] is the matching client used by
//! the command line.
//!
//! [`org.freedesktop.Notifications`]: https://specifications.freedesktop.org/notification-spec/latest/

mod proxy;
pub use proxy::*;

mod server;
pub use server::*;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use hub_core::HintValue;
use zbus::zvariant::Value;

pub mod names {
    pub const BUS_NAME: &str = "org.freedesktop.Notifications";
    pub const OBJECT_PATH: &str = "/org/freedesktop/Notifications";
}

/// Connect to the session bus, export `server` and claim the notification service name.
///
/// Failing to get the name is fatal: there can only be one notification server per session.
pub async fn serve(server: NotificationServer) -> Result<zbus::Connection> {
    let con = zbus::Connection::session().await.context("Failed to connect to the session bus")?;

    if !con.object_server().at(names::OBJECT_PATH, server).await? {
        bail!("Object already exists at {} on this connection", names::OBJECT_PATH);
    }

    let flags = [zbus::fdo::RequestNameFlags::DoNotQueue];
    use zbus::fdo::RequestNameReply::*;
    match con.request_name_with_flags(names::BUS_NAME, flags.into_iter().collect()).await {
        Ok(PrimaryOwner) | Ok(AlreadyOwner) => {
            log::info!("Acquired {}", names::BUS_NAME);
            Ok(con)
        }
        Ok(reply) => bail!("{} is owned by another notification server ({:?})", names::BUS_NAME, reply),
        Err(zbus::Error::NameTaken) => bail!("{} is owned by another notification server", names::BUS_NAME),
        Err(e) => Err(e).context(format!("Failed to request {}", names::BUS_NAME)),
    }
}

/// Resolves once this connection lost ownership of [`names::BUS_NAME`].
pub async fn wait_for_name_lost(con: &zbus::Connection) -> zbus::Result<()> {
    let dbus = zbus::fdo::DBusProxy::new(con).await?;
    let mut lost = dbus.receive_name_lost().await?;
    while let Some(sig) = lost.next().await {
        if sig.args()?.name().to_string() == names::BUS_NAME {
            return Ok(());
        }
    }
    Ok(())
}

/// Narrow a hint value from the wire into the shapes rules can compare against.
pub fn hint_value(value: &Value<'_>) -> HintValue {
    match value {
        Value::Bool(b) => HintValue::Bool(*b),
        Value::U8(n) => HintValue::Int(i64::from(*n)),
        Value::I16(n) => HintValue::Int(i64::from(*n)),
        Value::U16(n) => HintValue::Int(i64::from(*n)),
        Value::I32(n) => HintValue::Int(i64::from(*n)),
        Value::U32(n) => HintValue::Int(i64::from(*n)),
        Value::I64(n) => HintValue::Int(*n),
        Value::U64(n) => i64::try_from(*n).map(HintValue::Int).unwrap_or(HintValue::Other),
        Value::F64(x) => HintValue::Double(*x),
        Value::Str(s) => HintValue::Str(s.as_str().to_owned()),
        Value::Value(inner) => hint_value(inner),
        _ => HintValue::Other,
    }
}
