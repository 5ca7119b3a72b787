use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state::{RateLimiter, ResponseCache};

/// Background task that periodically drops expired rate-limit windows and
/// cache entries. Lives as long as the server; stopped via `shutdown`.
pub struct Sweeper {
    cache: Arc<ResponseCache>,
    limiter: Arc<RateLimiter>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(cache: Arc<ResponseCache>, limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self {
            cache,
            limiter,
            interval,
        }
    }

    /// Spawn the sweep loop. Send `true` on the returned sender (or drop it) to stop.
    pub fn spawn(self) -> (watch::Sender<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await; // consume immediate first tick

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep_once(Instant::now());
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Sweeper stopped");
    }

    /// Returns `(windows_dropped, cache_entries_dropped)`.
    pub fn sweep_once(&self, now: Instant) -> (usize, usize) {
        let windows = self.limiter.sweep(now);
        let entries = self.cache.purge_expired(now);
        debug!(
            windows_dropped = windows,
            cache_entries_dropped = entries,
            clients_tracked = self.limiter.tracked_clients(),
            cache_entries = self.cache.len(),
            "Sweep complete"
        );
        (windows, entries)
    }
}
