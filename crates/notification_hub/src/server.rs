use anyhow::{bail, Context, Result};
use hub_core::{Hub, NotificationSession, RuleSet};

use crate::{
    application_lifecycle,
    config::{self, HubConfig},
    dbus::{self, NotificationServer},
    events::{self, ChannelSink},
    expiry, HubPaths,
};

/// Run the notification server in the foreground until it is told to shut down.
pub fn initialize_server(paths: HubPaths) -> Result<()> {
    log::info!("Loading paths: {}", &paths);

    let hub_config = match config::read_from_file(&paths.get_config_file()) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{:?}", err);
            log::warn!("Falling back to the default configuration");
            HubConfig::default()
        }
    };

    application_lifecycle::install_signal_handler();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    rt.block_on(run(hub_config))
}

async fn run(hub_config: HubConfig) -> Result<()> {
    // subscribed up front so a signal arriving during startup still stops the server
    let mut exit = application_lifecycle::subscribe_exit();
    let (event_send, event_recv) = tokio::sync::mpsc::unbounded_channel();

    log::debug!("Loaded {} ignore rule(s)", hub_config.ignore.len());
    let session = NotificationSession::new(RuleSet::new(hub_config.ignore.clone()), Box::new(ChannelSink(event_send)))
        .with_label_body_length(hub_config.label_body_length);
    let hub = Hub::new(session);

    let expiry = expiry::spawn(hub.clone());
    let con = dbus::serve(NotificationServer::new(hub, expiry, &hub_config)).await?;

    let dispatcher = tokio::spawn(events::run_dispatcher(con.clone(), event_recv, application_lifecycle::subscribe_exit()));

    let lost_name = tokio::select! {
        result = exit.recv() => {
            result.context("Failed to receive lifecycle event")?;
            false
        }
        result = dbus::wait_for_name_lost(&con) => {
            result?;
            true
        }
    };

    if lost_name {
        bail!("Lost ownership of {}", dbus::names::BUS_NAME);
    }

    match dispatcher.await {
        Ok(result) => crate::print_result_err!("in the event dispatcher", result),
        Err(e) => log::error!("Event dispatcher panicked: {:?}", e),
    }
    log::info!("notification-hub stopped");
    Ok(())
}
