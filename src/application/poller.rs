// Cancellable repeating task used for periodic refreshes
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;

/// Handle to a running poller. Call `stop` on teardown; a dropped handle
/// also ends the task, but without waiting for it.
pub struct PollHandle {
    name: &'static str,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the poller and waits for an in-flight tick to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!("Poller {} ended abnormally: {}", self.name, e);
        }
        tracing::debug!("Poller {} stopped", self.name);
    }
}

/// Runs `on_tick` every `period`, first one `period` after the call.
pub fn spawn_poller<F, Fut>(name: &'static str, period: Duration, mut on_tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown, mut shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                Some(_) = ticks.next() => {
                    tracing::debug!("Poller {} tick", name);
                    on_tick().await;
                }
            }
        }
    });

    tracing::info!("Started poller {} every {:?}", name, period);
    PollHandle {
        name,
        shutdown,
        task,
    }
}
