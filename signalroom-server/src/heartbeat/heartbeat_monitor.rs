use crate::signaling::HubHandle;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodic timer that asks the hub to sweep for unresponsive connections.
pub struct HeartbeatMonitor {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl HeartbeatMonitor {
    /// Starts ticking one full `period` from now.
    pub fn spawn(hub: HubHandle, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_ms = period.as_millis() as u64, "heartbeat started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!("heartbeat tick");
                        if hub.sweep().await.is_err() {
                            debug!("hub gone, heartbeat exiting");
                            break;
                        }
                    }
                }
            }

            info!("heartbeat stopped");
        });

        Self { cancel, task }
    }

    /// Cancels the timer and waits for it to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
