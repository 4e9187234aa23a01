use crate::lifecycle::LifecycleEvent;
use tokio::sync::broadcast;

/// Fire-and-forget fan-out of lifecycle events.
///
/// Publishing never blocks and succeeds whether or not anybody listens; a
/// slow subscriber loses old events instead of slowing the hub down.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: LifecycleEvent) {
        // Err only means there are no subscribers right now.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
