use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Ceiling reached; the current window resets after `retry_after`.
    Limited { retry_after: Duration },
}

/// Fixed-window request counter per client address.
///
/// A client's first request, or any request after its window has reset, opens a
/// new window with count 1. Within a window requests are admitted until the count
/// reaches `max_requests`; rejected requests do not count. A ceiling of zero
/// rejects everything.
pub struct RateLimiter {
    clients: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn check(&self, client: &str) -> Admission {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Admission {
        let fresh = Window {
            count: 1,
            reset_at: now + self.window,
        };

        match self.clients.entry(client.to_string()) {
            Entry::Vacant(_) if self.max_requests == 0 => Admission::Limited {
                retry_after: self.window,
            },
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                Admission::Allowed
            }
            Entry::Occupied(mut slot) => {
                let w = slot.get_mut();
                if now > w.reset_at {
                    *w = fresh;
                    Admission::Allowed
                } else if w.count >= self.max_requests {
                    Admission::Limited {
                        retry_after: w.reset_at.saturating_duration_since(now),
                    }
                } else {
                    w.count += 1;
                    Admission::Allowed
                }
            }
        }
    }

    /// Drop windows that have reset by `now`. Returns the number removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients.retain(|_, w| now <= w.reset_at);
        before.saturating_sub(self.clients.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
