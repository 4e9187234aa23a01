pub mod heartbeat_tests;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::Level;

use signalroom_server::lifecycle::{EventBus, LifecycleEvent, LifecycleSink, SessionJournal, TracingSink};
use signalroom_server::{Config, Hub, HubHandle, RelayError, SignalServer};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A hub running on its own task, plus a subscription to its lifecycle events.
pub fn create_test_hub() -> (HubHandle, JoinHandle<()>, broadcast::Receiver<LifecycleEvent>) {
    let events = EventBus::new(64);
    let rx = events.subscribe();
    let (hub, task) = Hub::new(events).spawn();
    (hub, task, rx)
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: HubHandle,
    pub journal: Arc<SessionJournal>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), RelayError>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_heartbeat(Duration::from_secs(30)).await
    }

    pub async fn start_with_heartbeat(heartbeat_interval: Duration) -> Self {
        let config = Config {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            heartbeat_interval,
            shutdown_grace: Duration::from_secs(2),
            event_buffer: 64,
            journal_max_sessions: 100,
        };
        let journal = Arc::new(SessionJournal::with_max_sessions(config.journal_max_sessions));
        let sinks: Vec<Arc<dyn LifecycleSink>> = vec![journal.clone(), Arc::new(TracingSink)];

        let server = SignalServer::bind(config, sinks)
            .await
            .expect("Failed to bind test server");
        let addr = server.local_addr();
        let hub = server.hub();

        let (shutdown, rx) = oneshot::channel();
        let task = tokio::spawn(server.run_until(async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            hub,
            journal,
            shutdown,
            task,
        }
    }

    /// Triggers shutdown and waits for the server to finish tearing down.
    pub async fn stop(self) -> Result<(), RelayError> {
        let _ = self.shutdown.send(());
        self.task.await.expect("server task panicked")
    }
}
