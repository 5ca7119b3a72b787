use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

/// Key builders and namespace prefixes. Writes invalidate by prefix, so every
/// key under a namespace must start with that namespace's prefix.
pub mod keys {
    pub const MARKETS_PREFIX: &str = "markets:";
    pub const VOTES_PREFIX: &str = "votes:";
    pub const STATS: &str = "stats";
    pub const LEADERBOARD_PREFIX: &str = "leaderboard:";

    pub fn markets(category: Option<&str>, limit: i64, offset: i64) -> String {
        let category = category.filter(|c| !c.is_empty()).unwrap_or("all");
        format!("{MARKETS_PREFIX}{category}:{limit}:{offset}")
    }

    pub fn market(id: i64) -> String {
        format!("market:{id}")
    }

    pub fn recent_votes(limit: i64) -> String {
        format!("{VOTES_PREFIX}{limit}")
    }

    pub fn leaderboard(limit: i64) -> String {
        format!("{LEADERBOARD_PREFIX}{limit}")
    }

    /// Prefixes whose payloads depend on vote rows.
    pub const VOTE_DEPENDENT: &[&str] = &[MARKETS_PREFIX, VOTES_PREFIX, STATS, LEADERBOARD_PREFIX];
}

// ---------------------------------------------------------------------------
// ResponseCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

/// Process-local TTL cache of serialized JSON responses, keyed by endpoint + params.
/// Entries are only evicted by expiry (lazily on read, or by `purge_expired`) and
/// by explicit invalidation.
///
/// Every invalidation bumps `generation` before removing keys. A reader that
/// loaded its payload under an older generation must not leave it cached, see
/// `insert_if_fresh`.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
    generation: AtomicU64,
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Capture before loading a payload from the database.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    /// Returns the payload if present and unexpired at `now`. An expired entry is removed.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.payload.clone());
            }
        } else {
            return None;
        }
        // Re-check under the shard's write lock; a concurrent insert may have refreshed it.
        self.entries.remove_if(key, |_, e| now >= e.expires_at);
        None
    }

    pub fn insert(&self, key: String, payload: Value, ttl: Duration) {
        self.insert_at(key, payload, ttl, Instant::now());
    }

    pub fn insert_at(&self, key: String, payload: Value, ttl: Duration, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                expires_at: now + ttl,
            },
        );
    }

    /// Insert a payload loaded under `seen_generation`. If an invalidation ran
    /// since then the payload may predate the write, so it is withdrawn again.
    /// Returns whether the entry was kept.
    pub fn insert_if_fresh(
        &self,
        key: String,
        payload: Value,
        ttl: Duration,
        seen_generation: u64,
    ) -> bool {
        if self.generation() != seen_generation {
            return false;
        }
        self.insert(key.clone(), payload, ttl);
        if self.generation() != seen_generation {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    /// Remove one key. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.bump_generation();
        self.entries.remove(key).is_some()
    }

    /// Remove every key starting with any of `prefixes`. Returns the number removed.
    pub fn invalidate_prefixes(&self, prefixes: &[&str]) -> usize {
        self.bump_generation();
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let hit = prefixes.iter().any(|p| key.starts_with(p));
            if hit {
                removed += 1;
            }
            !hit
        });
        removed
    }

    /// Drop everything a vote on `market_id` can make stale.
    pub fn invalidate_for_vote(&self, market_id: i64) -> usize {
        let single = usize::from(self.invalidate(&keys::market(market_id)));
        single + self.invalidate_prefixes(keys::VOTE_DEPENDENT)
    }

    pub fn clear(&self) {
        self.bump_generation();
        self.entries.clear();
    }

    /// Drop entries expired at `now`. Returns the number removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| now < e.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
