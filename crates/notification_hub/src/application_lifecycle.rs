//! Process-wide shutdown signalling: SIGINT/SIGTERM are turned into a broadcast event that every
//! long-running task waits for on a receiver from [`subscribe_exit`].
//!
//! Receivers only see events sent after they subscribed, so every task subscribes once, before it
//! is spawned, and keeps that receiver for its whole lifetime.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

pub static APPLICATION_EXIT_SENDER: Lazy<broadcast::Sender<()>> = Lazy::new(|| broadcast::channel(2).0);

/// Notify all listening tasks that the server is shutting down.
pub fn send_exit() -> Result<()> {
    (APPLICATION_EXIT_SENDER).send(()).context("Failed to send exit lifecycle event")?;
    Ok(())
}

/// A receiver that yields Ok(()) once the server is shutting down.
pub fn subscribe_exit() -> broadcast::Receiver<()> {
    (APPLICATION_EXIT_SENDER).subscribe()
}

/// Forward SIGINT and SIGTERM to [`send_exit`].
pub fn install_signal_handler() {
    simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], move |_| {
        log::info!("Shutting down notification-hub...");
        if let Err(e) = send_exit() {
            log::error!("Failed to send application shutdown event to workers: {:?}", e);
            std::process::exit(1);
        }
    });
}

/// Select in a loop, breaking once a shutdown event (see `crate::application_lifecycle`) arrives on
/// the given receiver.
#[macro_export]
macro_rules! loop_select_exiting {
    ($exit:expr; $($content:tt)*) => {
        loop {
            tokio::select! {
                Ok(()) = $exit.recv() => {
                    break;
                }
                $($content)*
            }
        }
    };
}
