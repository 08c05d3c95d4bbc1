//! Forwarding of session events: protocol events become D-Bus signals, presentation events are
//! logged for whatever renders the tray.

use anyhow::Result;
use hub_core::{Event, EventSink};
use tokio::sync::{
    broadcast,
    mpsc::{UnboundedReceiver, UnboundedSender},
};

use crate::dbus::{names, NotificationServer};

/// [`EventSink`] that hands events to [`run_dispatcher`] without ever blocking the session.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub UnboundedSender<Event>);

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) {
        if let Err(e) = self.0.send(event) {
            log::warn!("Event dispatcher is gone, dropping {:?}", e.0);
        }
    }
}

/// Emit every received event on `con` until `exit` fires. A failing signal is logged and skipped.
pub async fn run_dispatcher(
    con: zbus::Connection,
    mut events: UnboundedReceiver<Event>,
    mut exit: broadcast::Receiver<()>,
) -> Result<()> {
    let ctxt = zbus::SignalContext::new(&con, names::OBJECT_PATH)?;
    crate::loop_select_exiting! { exit;
        Some(event) = events.recv() => {
            let result = dispatch(&ctxt, &event).await;
            crate::print_result_err!(format!("while emitting {:?}", event), result);
        },
        else => break,
    }
    Ok(())
}

async fn dispatch(ctxt: &zbus::SignalContext<'_>, event: &Event) -> zbus::Result<()> {
    match event {
        Event::Changed { count } => NotificationServer::changed(ctxt, *count).await,
        Event::NotificationClosed { id, reason } => NotificationServer::notification_closed(ctxt, *id, reason.code()).await,
        Event::ActionInvoked { id, action_key } => NotificationServer::action_invoked(ctxt, *id, action_key).await,
        Event::ThreadOpened { key, label } => {
            log::info!("New thread {}: {}", key, label);
            Ok(())
        }
        Event::ThreadRelabeled { key, label } => {
            log::info!("Thread {} is now: {}", key, label);
            Ok(())
        }
        Event::ThreadCleared { key } => {
            log::info!("Thread {} cleared", key);
            Ok(())
        }
        Event::TrayStatus(status) => {
            log::info!("Tray status: {}", status);
            Ok(())
        }
    }
}
