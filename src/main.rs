//! # SeatWatch: course seat availability watcher
//!
//! Accepts subscriptions over HTTP, polls the enrollment endpoint once per
//! interval for each subscriber, and emails them when a seat opens.
//!
//! Usage:
//!   seatwatch                              # Serve on 0.0.0.0:8080
//!   seatwatch --config ./seatwatch.toml    # Custom config file
//!   seatwatch --port 9000 --dry-run        # Log notices instead of emailing

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use seatwatch_core::config::{NotifierKind, SeatWatchConfig};
use seatwatch_scheduler::SubscriptionRegistry;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "seatwatch",
    version,
    about = "🎓 SeatWatch: get an email when a course seat opens up"
)]
struct Cli {
    /// Config file (default: $SEATWATCH_CONFIG or ~/.seatwatch/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log notifications instead of sending email
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn load_config(cli: &Cli) -> Result<SeatWatchConfig> {
    let explicit = cli
        .config
        .clone()
        .or_else(|| std::env::var("SEATWATCH_CONFIG").ok());

    let mut config = match explicit {
        Some(path) => {
            let path = expand_path(&path);
            tracing::info!("📄 Loading config from {}", path.display());
            SeatWatchConfig::load_from(&path)?
        }
        None => SeatWatchConfig::load()?,
    };

    config.apply_env_overrides();
    if let Some(host) = &cli.host {
        config.gateway.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if cli.dry_run {
        config.notifier.kind = NotifierKind::Log;
    }
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("👋 Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "seatwatch=debug,seatwatch_scheduler=debug,seatwatch_channels=debug,seatwatch_gateway=debug,tower_http=debug"
    } else {
        "seatwatch=info,seatwatch_scheduler=info,seatwatch_channels=info,seatwatch_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = Arc::new(load_config(&cli)?);

    let checker = Arc::new(seatwatch_channels::BannerChecker::new(&config.checker)?);
    let notifier = seatwatch_channels::notifier_from_config(&config.notifier)?;

    tracing::info!("🎓 SeatWatch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("   🔎 Checker:  {}", checker.endpoint());
    tracing::info!("   📤 Notifier: {}", notifier.name());
    tracing::info!(
        "   ⏰ Polling every {}s (term {})",
        config.watch.poll_interval_secs,
        config.watch.term
    );

    let registry = Arc::new(SubscriptionRegistry::new(checker, notifier));
    let state = seatwatch_gateway::AppState::new(registry.clone(), config.clone());

    seatwatch_gateway::start(&config.gateway, state, shutdown_signal()).await?;

    registry.shutdown().await;
    Ok(())
}
