use crate::config::Config;
use crate::error::RelayError;
use crate::heartbeat::HeartbeatMonitor;
use crate::lifecycle::{EventBus, LifecycleSink, spawn_sink};
use crate::signaling::{Hub, HubHandle, ws_handler};
use axum::Router;
use axum::routing::get;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Shared state handed to every websocket upgrade.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    /// Live websocket sessions, so shutdown can wait for them to flush.
    pub sessions: TaskTracker,
}

/// The websocket endpoint, served at `/` and `/ws`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// A bound relay: listener, hub and lifecycle sinks, not yet serving.
pub struct SignalServer {
    config: Config,
    listener: TcpListener,
    local_addr: SocketAddr,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
    sink_tasks: Vec<JoinHandle<()>>,
    sessions: TaskTracker,
}

impl SignalServer {
    pub async fn bind(
        config: Config,
        sinks: Vec<Arc<dyn LifecycleSink>>,
    ) -> Result<Self, RelayError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| RelayError::Bind { addr, source })?;

        let events = EventBus::new(config.event_buffer);
        let sink_tasks = sinks
            .into_iter()
            .map(|sink| spawn_sink(sink, events.subscribe()))
            .collect();
        let (hub, hub_task) = Hub::new(events).spawn();

        Ok(Self {
            config,
            listener,
            local_addr,
            hub,
            hub_task,
            sink_tasks,
            sessions: TaskTracker::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Serves until `shutdown` resolves, then tears everything down in order:
    /// heartbeat, listener, open connections, lifecycle sinks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            config,
            listener,
            local_addr,
            hub,
            hub_task,
            sink_tasks,
            sessions,
        } = self;

        let heartbeat = HeartbeatMonitor::spawn(hub.clone(), config.heartbeat_interval);

        let stop_accepting = CancellationToken::new();
        let app = router(AppState {
            hub: hub.clone(),
            sessions: sessions.clone(),
        });
        let mut serve = tokio::spawn({
            let stop_accepting = stop_accepting.clone();
            async move {
                axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(stop_accepting.cancelled_owned())
                .await
            }
        });
        info!(addr = %local_addr, "signalroom listening");

        let early_exit = tokio::select! {
            _ = shutdown => {
                info!("shutdown requested");
                None
            }
            result = &mut serve => Some(result),
        };

        heartbeat.stop().await;
        stop_accepting.cancel();

        if hub.shutdown().await.is_err() {
            warn!("hub stopped before shutdown");
        }
        sessions.close();

        let served = match early_exit {
            Some(result) => result,
            None => match timeout(config.shutdown_grace, &mut serve).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("listener did not stop within the grace period");
                    serve.abort();
                    Ok(Ok(()))
                }
            },
        };

        if timeout(config.shutdown_grace, sessions.wait()).await.is_err() {
            warn!(
                open = sessions.len(),
                "websockets did not finish within the grace period"
            );
        }

        drop(hub);
        let _ = hub_task.await;
        for task in sink_tasks {
            let _ = task.await;
        }
        info!("signalroom stopped");

        match served {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RelayError::Serve(e)),
            Err(e) => Err(RelayError::Serve(std::io::Error::other(e))),
        }
    }
}
