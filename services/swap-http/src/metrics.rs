use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide counters owned by [`crate::AppState`].
#[derive(Debug)]
pub struct ServiceMetrics {
    requests_total: AtomicU64,
    replacements_total: AtomicU64,
    limit_reached_total: AtomicU64,
    client_errors_total: AtomicU64,
    server_errors_total: AtomicU64,
    rate_limited_total: AtomicU64,
    started_at: DateTime<Utc>,
    started: Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub replacements_total: u64,
    pub limit_reached_total: u64,
    pub client_errors_total: u64,
    pub server_errors_total: u64,
    pub rate_limited_total: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            replacements_total: AtomicU64::new(0),
            limit_reached_total: AtomicU64::new(0),
            client_errors_total: AtomicU64::new(0),
            server_errors_total: AtomicU64::new(0),
            rate_limited_total: AtomicU64::new(0),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, replacements: u64, limit_reached: bool) {
        self.replacements_total
            .fetch_add(replacements, Ordering::Relaxed);
        if limit_reached {
            self.limit_reached_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_client_error(&self) {
        self.client_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_server_error(&self) {
        self.server_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            replacements_total: self.replacements_total.load(Ordering::Relaxed),
            limit_reached_total: self.limit_reached_total.load(Ordering::Relaxed),
            client_errors_total: self.client_errors_total.load(Ordering::Relaxed),
            server_errors_total: self.server_errors_total.load(Ordering::Relaxed),
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: self.uptime_secs(),
        }
    }
}
