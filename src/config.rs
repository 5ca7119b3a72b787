use std::time::Duration;

use crate::error::{AppError, Result};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DB_PATH: &str = "data/moltvote.db";

/// Requests allowed per client per window.
pub const RATE_LIMIT_MAX: u32 = 1000;

/// Fixed rate-limit window length (seconds).
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// How often expired rate-limit windows and cache entries are dropped (seconds).
pub const SWEEP_INTERVAL_SECS: u64 = 300;

/// Request body size ceiling in bytes.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024;

/// Cache TTLs per endpoint. List and recent-vote endpoints use `Config::cache_ttl`.
pub mod cache_ttl {
    pub const DEFAULT_MS: u64 = 10_000;
    pub const MARKET_MS: u64 = 5_000;
    pub const STATS_MS: u64 = 30_000;
    pub const LEADERBOARD_MS: u64 = 30_000;
}

/// Page-size limits for list endpoints: (default, max).
pub mod page_limits {
    pub const MARKETS: (i64, i64) = (50, 100);
    pub const RECENT_VOTES: (i64, i64) = (20, 50);
    pub const LEADERBOARD: (i64, i64) = (50, 100);
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub db_max_connections: u32,
    pub port: u16,
    /// Shared secret for `X-Admin-Key` (ADMIN_KEY). Admin routes reject everything when unset.
    pub admin_key: Option<String>,
    /// Requests per window per client (RATE_LIMIT_MAX)
    pub rate_limit_max: u32,
    /// Window length (RATE_LIMIT_WINDOW_SECS)
    pub rate_limit_window: Duration,
    /// Default response cache TTL (CACHE_TTL_MS)
    pub cache_ttl: Duration,
    /// Sweeper period (SWEEP_INTERVAL_SECS)
    pub sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(5),
            port: match std::env::var("PORT") {
                Ok(v) => v
                    .parse::<u16>()
                    .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?,
                Err(_) => DEFAULT_PORT,
            },
            admin_key: std::env::var("ADMIN_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            rate_limit_max: std::env::var("RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(RATE_LIMIT_MAX),
            rate_limit_window: Duration::from_secs(
                std::env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(RATE_LIMIT_WINDOW_SECS),
            ),
            cache_ttl: Duration::from_millis(
                std::env::var("CACHE_TTL_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(cache_ttl::DEFAULT_MS),
            ),
            sweep_interval: Duration::from_secs(
                std::env::var("SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .filter(|s| *s > 0)
                    .unwrap_or(SWEEP_INTERVAL_SECS),
            ),
        })
    }
}

/// Clamp a requested page size into `1..=max`; missing or non-positive values use `default`.
pub fn clamp_limit(requested: Option<i64>, (default, max): (i64, i64)) -> i64 {
    requested.filter(|l| *l > 0).unwrap_or(default).min(max)
}
