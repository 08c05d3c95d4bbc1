use std::collections::HashMap;

use anyhow::{Context, Result};
use futures::StreamExt;
use zbus::zvariant::Value;

use crate::{
    dbus::NotificationsProxy,
    opts::{ActionClient, HintArg, NotifyArgs},
};

/// Run a client action against the server on the session bus.
pub async fn handle_client_action(action: ActionClient) -> Result<()> {
    let con = zbus::Connection::session().await.context("Failed to connect to the session bus")?;
    let proxy = NotificationsProxy::new(&con).await?;

    match action {
        ActionClient::Count => println!("{}", proxy.count_notifications().await?),
        ActionClient::Watch => {
            // subscribe before the initial query, so no change can slip through in between
            let mut changes = proxy.receive_changed().await?;
            println!("{}", proxy.count_notifications().await?);
            while let Some(sig) = changes.next().await {
                println!("{}", sig.args()?.count);
            }
        }
        ActionClient::List { json } => {
            let notifications = proxy.get_notifications().await.context("Failed to list notifications")?;
            if json {
                let entries: Vec<_> = notifications
                    .into_iter()
                    .map(|(id, app_name, summary, timestamp)| {
                        serde_json::json!({ "id": id, "app_name": app_name, "summary": summary, "timestamp": timestamp })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&entries)?);
            } else {
                for (id, app_name, summary, timestamp) in notifications {
                    println!("{}\t{}\t{}\t{}", id, format_timestamp(timestamp), app_name, summary);
                }
            }
        }
        ActionClient::Close { id } => proxy.close_notification(id).await?,
        ActionClient::Dismiss { id } => proxy.delete_notification(id).await?,
        ActionClient::Invoke { id, action_key } => {
            if !proxy.invoke_action(id, &action_key).await? {
                anyhow::bail!("Notification {} is not open or has no action {:?}", id, action_key);
            }
        }
        ActionClient::Acknowledge => proxy.acknowledge().await?,
        ActionClient::Info => {
            let (name, vendor, version, spec_version) = proxy.get_server_information().await?;
            println!("{} {} ({}), protocol {}", name, version, vendor, spec_version);
            println!("capabilities: {}", proxy.get_capabilities().await?.join(" "));
        }
        ActionClient::Notify(args) => println!("{}", send_notification(&proxy, args).await?),
    }
    Ok(())
}

async fn send_notification(proxy: &NotificationsProxy<'_>, args: NotifyArgs) -> Result<u32> {
    let NotifyArgs { app_name, replaces, icon, expire_timeout, hints, actions, summary, body } = args;
    let actions: Vec<&str> = actions.iter().flat_map(|(key, label)| [key.as_str(), label.as_str()]).collect();
    let hints: HashMap<&str, Value<'_>> = hints
        .iter()
        .map(|(key, value)| {
            let value = match value {
                HintArg::Bool(b) => Value::from(*b),
                HintArg::Int(n) => Value::from(*n),
                HintArg::Str(s) => Value::from(s.as_str()),
            };
            (key.as_str(), value)
        })
        .collect();

    proxy
        .notify(&app_name, replaces, &icon, &summary, &body, &actions, hints, expire_timeout)
        .await
        .context("Failed to send notification")
}

fn format_timestamp(timestamp: i64) -> String {
    match chrono::DateTime::from_timestamp(timestamp, 0) {
        Some(time) => time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}
