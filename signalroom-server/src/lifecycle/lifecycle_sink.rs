use crate::lifecycle::LifecycleEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A consumer of lifecycle events, e.g. a session history store.
///
/// Sinks run on their own task. Whatever they return, signaling carries on.
#[async_trait]
pub trait LifecycleSink: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn record(&self, event: &LifecycleEvent) -> anyhow::Result<()>;

    /// Called once after the last event, when the server shuts down.
    async fn close(&self) {}
}

/// Drives `sink` from `events` until the publishing side goes away.
pub fn spawn_sink(
    sink: Arc<dyn LifecycleSink>,
    mut events: broadcast::Receiver<LifecycleEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(sink = sink.name(), "lifecycle sink started");

        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = sink.record(&event).await {
                        warn!(
                            sink = sink.name(),
                            event = event.kind(),
                            connection_id = %event.connection_id(),
                            error = %e,
                            "lifecycle sink failed to record event"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(sink = sink.name(), skipped, "lifecycle sink fell behind, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }

        sink.close().await;
        debug!(sink = sink.name(), "lifecycle sink stopped");
    })
}
