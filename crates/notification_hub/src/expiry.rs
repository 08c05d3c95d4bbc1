//! Expiry timers. One task owns a [`DelayQueue`] of notification ids and closes each notification
//! with [`CloseReason::Expired`] once its deadline passes.

use std::{collections::HashMap, time::Duration};

use hub_core::{CloseReason, Hub};
use tokio::sync::{
    broadcast,
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
};
use tokio_util::time::{delay_queue, DelayQueue};

/// Longest accepted expiry. [`DelayQueue`] can't represent deadlines much further out than a couple
/// of years, so anything beyond this is treated as "never expires".
pub const MAX_EXPIRY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExpiryCommand {
    /// Expire `id` after the given duration, replacing any deadline it already had.
    Schedule { id: u32, after: Duration },
    Cancel { id: u32 },
}

/// Handle to the expiry task. Dropping every handle stops the task.
#[derive(Debug, Clone)]
pub struct ExpiryHandle(UnboundedSender<ExpiryCommand>);

impl ExpiryHandle {
    pub fn schedule(&self, id: u32, after: Duration) {
        self.send(ExpiryCommand::Schedule { id, after });
    }

    pub fn cancel(&self, id: u32) {
        self.send(ExpiryCommand::Cancel { id });
    }

    fn send(&self, command: ExpiryCommand) {
        if let Err(e) = self.0.send(command) {
            log::warn!("Expiry task is gone, dropping {:?}", e.0);
        }
    }

    /// A handle that isn't connected to any task.
    #[cfg(test)]
    pub fn detached() -> Self {
        ExpiryHandle(unbounded_channel().0)
    }

    /// A handle whose commands end up in the returned receiver instead of a task.
    #[cfg(test)]
    pub(crate) fn channel() -> (Self, UnboundedReceiver<ExpiryCommand>) {
        let (send, recv) = unbounded_channel();
        (ExpiryHandle(send), recv)
    }
}

/// Start the expiry task on the current tokio runtime. It stops on application exit.
pub fn spawn(hub: Hub) -> ExpiryHandle {
    spawn_until(hub, crate::application_lifecycle::subscribe_exit())
}

fn spawn_until(hub: Hub, exit: broadcast::Receiver<()>) -> ExpiryHandle {
    let (send, recv) = unbounded_channel();
    tokio::spawn(run(hub, recv, exit));
    ExpiryHandle(send)
}

enum Step {
    Command(ExpiryCommand),
    Expired(u32),
}

async fn run(hub: Hub, mut commands: UnboundedReceiver<ExpiryCommand>, mut exit: broadcast::Receiver<()>) {
    let mut queue: DelayQueue<u32> = DelayQueue::new();
    let mut keys: HashMap<u32, delay_queue::Key> = HashMap::new();

    loop {
        // the queue can't be borrowed by the select and the handlers at the same time, so the
        // select only decides what happened
        let step = tokio::select! {
            Ok(()) = exit.recv() => break,
            Some(command) = commands.recv() => Step::Command(command),
            Some(expired) = std::future::poll_fn(|cx| queue.poll_expired(cx)) => Step::Expired(expired.into_inner()),
            else => break,
        };

        match step {
            Step::Command(ExpiryCommand::Schedule { id, after }) if after > MAX_EXPIRY => {
                log::warn!("Expiry of {:?} for notification {} is too far out, keeping it open", after, id);
                if let Some(key) = keys.remove(&id) {
                    queue.remove(&key);
                }
            }
            Step::Command(ExpiryCommand::Schedule { id, after }) => match keys.get(&id) {
                Some(key) => queue.reset(key, after),
                None => {
                    keys.insert(id, queue.insert(id, after));
                }
            },
            Step::Command(ExpiryCommand::Cancel { id }) => {
                if let Some(key) = keys.remove(&id) {
                    queue.remove(&key);
                }
            }
            Step::Expired(id) => {
                keys.remove(&id);
                log::debug!("Notification {} expired", id);
                hub.close(id, CloseReason::Expired);
            }
        }
    }
    log::debug!("Expiry task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::{NotificationRequest, NotificationSession, NullSink, RuleSet};

    fn hub_with(n: usize) -> Hub {
        let hub = Hub::new(NotificationSession::new(RuleSet::default(), Box::new(NullSink)));
        for i in 0..n {
            hub.notify(NotificationRequest::new("App", i.to_string(), "")).unwrap();
        }
        hub
    }

    /// Expiry task that only stops when its handles are dropped.
    fn spawn_for_test(hub: Hub) -> ExpiryHandle {
        spawn_until(hub, broadcast::channel(1).1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_deadline() {
        let hub = hub_with(2);
        let expiry = spawn_for_test(hub.clone());
        expiry.schedule(1, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(2, hub.count());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(None, hub.get(1));
        assert!(hub.get(2).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_and_cancel() {
        let hub = hub_with(2);
        let expiry = spawn_for_test(hub.clone());
        expiry.schedule(1, Duration::from_secs(5));
        expiry.schedule(2, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(3)).await;
        expiry.schedule(1, Duration::from_secs(5));
        expiry.cancel(2);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(2, hub.count());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(None, hub.get(1));
        assert!(hub.get(2).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_far_deadline_keeps_task_alive() {
        let hub = hub_with(3);
        let expiry = spawn_for_test(hub.clone());
        expiry.schedule(1, Duration::from_millis(100_000_000_000));
        expiry.schedule(2, Duration::from_secs(1));
        expiry.schedule(3, Duration::from_secs(1));
        expiry.schedule(3, Duration::MAX);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(hub.get(1).is_some());
        assert_eq!(None, hub.get(2));
        assert!(hub.get(3).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_exit() {
        let hub = hub_with(1);
        let (exit_send, exit) = broadcast::channel(1);
        let expiry = spawn_until(hub.clone(), exit);
        tokio::task::yield_now().await;
        exit_send.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        expiry.schedule(1, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(hub.get(1).is_some());
    }
}
