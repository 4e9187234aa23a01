use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use signalroom::server::{Config, LifecycleSink, SessionJournal, SignalServer, TracingSink};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "signalroom=info,signalroom_server=info";

/// WebRTC signaling relay for sender/viewer rooms.
///
/// Every flag falls back to its environment variable, then to the built-in
/// default.
#[derive(Parser)]
#[command(name = "signalroom", version)]
struct Cli {
    /// Port to listen on [env: PORT]
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind [env: BIND_HOST]
    #[arg(long)]
    host: Option<IpAddr>,

    /// Milliseconds between liveness pings [env: HEARTBEAT_INTERVAL_MS]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_interval_ms: Option<u64>,

    /// Keep an in-memory session journal and log its summary on exit
    #[arg(long, overrides_with = "no_journal", default_value_t = true)]
    journal: bool,

    #[arg(long = "no-journal", overrides_with = "journal")]
    no_journal: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(ms) = self.heartbeat_interval_ms {
            config.heartbeat_interval = Duration::from_millis(ms);
        }
    }

    fn journal_enabled(&self) -> bool {
        self.journal && !self.no_journal
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let mut config = Config::from_env().context("Invalid configuration")?;
    cli.apply(&mut config);

    let mut sinks: Vec<Arc<dyn LifecycleSink>> = vec![Arc::new(TracingSink)];
    if cli.journal_enabled() {
        sinks.push(Arc::new(SessionJournal::with_max_sessions(
            config.journal_max_sessions,
        )));
    }

    let server = SignalServer::bind(config, sinks)
        .await
        .context("Failed to start server")?;

    println!("{}", "📡 signalroom is up".green().bold());
    println!("   🔌 ws://{}/ws", server.local_addr());
    println!(
        "   💓 heartbeat every {} ms",
        server.config().heartbeat_interval.as_millis()
    );

    server.run_until(shutdown_signal()).await?;

    println!("{}", "👋 signalroom stopped".cyan());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
