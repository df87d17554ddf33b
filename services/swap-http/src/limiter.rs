use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: Instant,
    hits: u32,
}

/// Fixed-window request counter keyed by client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
    window: Duration,
    max_requests: u32,
}

/// Rejection carrying the time left until the client's window resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds for a `Retry-After` header, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            window,
            max_requests,
        }
    }

    pub fn check(&self, client: &str) -> Result<(), RateLimited> {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimited> {
        let mut entry = self.windows.entry(client.to_string()).or_insert(Window {
            opened_at: now,
            hits: 0,
        });

        let elapsed = now.saturating_duration_since(entry.opened_at);
        if elapsed >= self.window {
            entry.opened_at = now;
            entry.hits = 0;
        }

        if entry.hits >= self.max_requests {
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(entry.opened_at));
            return Err(RateLimited { retry_after });
        }

        entry.hits += 1;
        Ok(())
    }

    /// Drops windows that have fully elapsed.
    pub fn prune_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.opened_at) < self.window);
        before - self.windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Spawns a task that prunes expired windows once per window length.
    pub fn start_pruning_task(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(limiter.window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = limiter.prune_at(Instant::now());
                if removed > 0 {
                    debug!(removed, "pruned expired rate-limit windows");
                }
            }
        })
    }
}
