use crate::lifecycle::{LifecycleEvent, LifecycleSink};
use async_trait::async_trait;
use tracing::info;

/// Writes every lifecycle event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl LifecycleSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn record(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        match event {
            LifecycleEvent::Connected {
                connection_id,
                meta,
                ..
            } => info!(
                target: "signalroom::lifecycle",
                %connection_id,
                remote_addr = ?meta.remote_addr,
                user_agent = meta.user_agent.as_deref().unwrap_or("-"),
                "connection opened"
            ),
            LifecycleEvent::Joined {
                connection_id,
                room_id,
                role,
                ..
            } => info!(
                target: "signalroom::lifecycle",
                %connection_id,
                %room_id,
                %role,
                "session started"
            ),
            LifecycleEvent::Disconnected {
                connection_id,
                room_id,
                reason,
                ..
            } => info!(
                target: "signalroom::lifecycle",
                %connection_id,
                room_id = room_id.as_ref().map(|r| r.as_str()).unwrap_or("-"),
                %reason,
                "connection closed"
            ),
        }
        Ok(())
    }
}
