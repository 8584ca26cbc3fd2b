//! ngxmon: nginx status poller and metric forwarder.
//!
//! Main entry point that loads configuration, wires the worker crate
//! together and runs the poll loop until Ctrl+C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use ngxmon_core::config::AppConfig;
use ngxmon_core::error::AppError;
use ngxmon_stats::StatsPipeline;
use ngxmon_worker::http::ClientOptions;
use ngxmon_worker::{
    HttpStatusSource, HttpTransport, MetricForwarder, PollRunner, TopologyRegistrar,
};

/// Poll an nginx status page and forward interval metrics.
#[derive(Debug, Parser)]
#[command(name = "ngxmon", version, about)]
struct Cli {
    /// Extra configuration file merged over `config/default` and `config/{env}`
    #[arg(short, long)]
    config: Option<String>,

    /// Environment name selecting `config/{env}.toml`
    #[arg(short, long, env = "NGXMON_ENV", default_value = "development")]
    env: String,

    /// Poll once, print the metric batch as JSON and exit without forwarding
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env, cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = if cli.once {
        poll_once(config).await
    } else {
        run(config).await
    };

    if let Err(e) = result {
        tracing::error!("ngxmon error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Single poll for `--once`
async fn poll_once(config: AppConfig) -> Result<(), AppError> {
    let source = Arc::new(HttpStatusSource::new(&config.nginx)?);
    let mut runner = PollRunner::new(
        source,
        StatsPipeline::new(config.resolved_source()),
        None,
        config.poller.interval(),
    );

    let batch = runner.poll_once().await?;
    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}

/// Main run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    let source_name = config.resolved_source();
    tracing::info!(
        "Starting ngxmon v{} (source: {})",
        env!("CARGO_PKG_VERSION"),
        source_name
    );

    // ── Status source and metric feed ────────────────────────────
    let source = Arc::new(HttpStatusSource::new(&config.nginx)?);
    tracing::info!("Polling {} every {:?}", source.url(), config.poller.interval());

    let agent_transport = Arc::new(HttpTransport::new(&ClientOptions {
        timeout: config.agent.timeout(),
        accept_invalid_certs: false,
        proxy: None,
    })?);
    let forwarder = Arc::new(MetricForwarder::from_config(agent_transport, &config.agent));
    tracing::info!("Forwarding metrics to {}", forwarder.endpoint().url);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Topology registration ────────────────────────────────────
    let topology_handle = if config.topology.enabled {
        let options = TopologyRegistrar::client_options(&config.topology);
        let transport = Arc::new(HttpTransport::new(&options)?);
        let registrar = TopologyRegistrar::new(transport, config.topology.clone(), source_name.clone());

        tracing::info!("Topology registration enabled ({})", config.topology.base_url());
        let cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            registrar.run(cancel).await;
        }))
    } else {
        tracing::info!("Topology registration disabled");
        None
    };

    // ── Poll loop ────────────────────────────────────────────────
    let runner = PollRunner::new(
        source,
        StatsPipeline::new(source_name),
        Some(forwarder),
        config.poller.interval(),
    );
    let poll_handle = tokio::spawn(runner.run(shutdown_rx));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");
    let _ = shutdown_tx.send(true);

    // ── Wait for background tasks ────────────────────────────────
    let _ = tokio::time::timeout(Duration::from_secs(10), poll_handle).await;
    if let Some(handle) = topology_handle {
        let _ = tokio::time::timeout(Duration::from_secs(10), handle).await;
    }

    tracing::info!("ngxmon shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
