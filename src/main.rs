use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aegis_audit::AuditEmitter;
use aegis_gateway::{router, AdapterRouter, GatewayState, PolicyWatcher};
use aegis_policy::PolicyStore;
use aegis_types::GatewayConfig;

/// Aegis -- policy-enforcing gateway between agents and tool adapters.
#[derive(Parser, Debug)]
#[command(name = "aegis", version, about)]
struct Cli {
    /// Listen address for the gateway HTTP server
    #[arg(long)]
    listen: Option<String>,

    /// Directory containing .yaml policy files
    #[arg(long)]
    policy_dir: Option<PathBuf>,

    /// Path to the append-only audit log
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Adapter mapping, repeatable: --adapter payments=http://localhost:8081
    #[arg(long = "adapter", value_name = "TOOL=URL")]
    adapters: Vec<String>,

    /// TOML configuration file (CLI flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (RUST_LOG=debug)
    #[arg(long, short)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on flags: --verbose sets debug, --quiet sets
    // error, otherwise respect RUST_LOG.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::from_default_env()
    };

    // Diagnostics go to stderr; stdout carries the audit record stream.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(dir) = cli.policy_dir {
        config.policy_dir = dir;
    }
    if let Some(path) = cli.audit_log {
        config.audit_log = path;
    }
    for spec in &cli.adapters {
        config.apply_adapter_flag(spec)?;
    }

    let store = Arc::new(PolicyStore::open(&config.policy_dir).with_context(|| {
        format!(
            "failed to load policies from {}",
            config.policy_dir.display()
        )
    })?);
    let watcher = PolicyWatcher::start(Arc::clone(&store))?;
    let emitter = Arc::new(AuditEmitter::open(&config.audit_log));
    let state = Arc::new(GatewayState::new(
        store,
        AdapterRouter::new(config.adapters.clone()),
        emitter,
    )?);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    tracing::info!(
        addr = %config.listen,
        policy_dir = %config.policy_dir.display(),
        adapters = config.adapters.len(),
        "aegis gateway listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server error")?;

    watcher.stop();
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
