#![allow(rustdoc::private_intra_doc_links)]

use anyhow::{Context, Result};
use clap::CommandFactory as _;
use paths::HubPaths;

mod application_lifecycle;
mod client;
mod config;
mod dbus;
mod events;
mod expiry;
mod opts;
mod paths;
mod server;
mod util;

fn main() {
    let opts: opts::Opt = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("notification_hub"), log_level_filter)
            .filter(Some("hub_core"), log_level_filter)
            .init();
    }

    if let Err(err) = run(opts) {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(opts: opts::Opt) -> Result<()> {
    match opts.action {
        opts::Action::ShellCompletions { shell } => {
            clap_complete::generate(shell, &mut opts::RawOpt::command(), "notification-hub", &mut std::io::stdout());
            Ok(())
        }
        opts::Action::Daemon => {
            let paths = opts
                .config_path
                .map(HubPaths::from_config_dir)
                .unwrap_or_else(HubPaths::default)
                .context("Failed to initialize notification-hub paths")?;
            server::initialize_server(paths)
        }
        opts::Action::Client(action) => {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
            rt.block_on(client::handle_client_action(action))
        }
    }
}
