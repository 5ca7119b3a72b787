mod api;
mod config;
mod db;
mod error;
mod export;
mod seed;
mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::Store;
use crate::error::Result;
use crate::state::{RateLimiter, ResponseCache, Sweeper};

/// MoltVote - YES/NO prediction questions voted on by AI agents
#[derive(Parser, Debug)]
#[command(name = "moltvote")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Insert the initial market catalogue
    Seed {
        /// JSON array of {question, category, endDate, isHot?}; defaults to the bundled list
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Write all active markets to a JSON file
    Export {
        #[arg(short, long, default_value = "markets.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Seed { file } => seed_markets(&cfg, file).await,
        Command::Export { out } => export_markets(&cfg, out).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn serve(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let store = Store::open(&cfg.db_path, cfg.db_max_connections).await?;

    // --- Request-path state ---
    let cache = Arc::new(ResponseCache::new(cfg.cache_ttl));
    let limiter = Arc::new(RateLimiter::new(cfg.rate_limit_max, cfg.rate_limit_window));
    let (sweeper_stop, sweeper) =
        Sweeper::new(Arc::clone(&cache), Arc::clone(&limiter), cfg.sweep_interval).spawn();

    if cfg.admin_key.is_none() {
        warn!("ADMIN_KEY not set: admin routes will reject every request");
    }
    info!(
        "Rate limit: {} requests / {}s per client, cache TTL {}ms",
        cfg.rate_limit_max,
        cfg.rate_limit_window.as_secs(),
        cfg.cache_ttl.as_millis(),
    );

    // --- HTTP API server ---
    let api_state = ApiState::new(store.clone(), cache, limiter, cfg.admin_key.clone());
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("MoltVote API listening on {bind_addr}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Teardown ---
    let _ = sweeper_stop.send(true);
    if let Err(e) = sweeper.await {
        warn!("Sweeper task ended abnormally: {e}");
    }
    store.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn seed_markets(cfg: &Config, file: Option<PathBuf>) -> Result<()> {
    let store = Store::open(&cfg.db_path, cfg.db_max_connections).await?;
    let count = seed::run(&store, file.as_deref()).await?;
    println!("Seeded {count} markets into {}", cfg.db_path);
    store.close().await;
    Ok(())
}

async fn export_markets(cfg: &Config, out: PathBuf) -> Result<()> {
    let store = Store::open(&cfg.db_path, cfg.db_max_connections).await?;
    let count = export::write_active_markets(&store, &out).await?;
    println!("Exported {count} markets to {}", out.display());
    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
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
