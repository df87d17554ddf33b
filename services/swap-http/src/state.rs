use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use json_swap_core::Replacer;

use crate::config::SwapConfig;
use crate::limiter::RateLimiter;
use crate::metrics::ServiceMetrics;

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppState {
    pub config: Arc<SwapConfig>,
    pub replacer: Replacer,
    pub metrics: ServiceMetrics,
    pub limiter: RateLimiter,
    shutting_down: AtomicBool,
}

impl AppState {
    pub fn new(config: SwapConfig) -> Result<Self> {
        config.validate()?;
        let replacer = Replacer::new(config.token_pair()?);
        let limiter = RateLimiter::new(config.rate_limit_window(), config.rate_limit_max_requests);

        Ok(Self {
            config: Arc::new(config),
            replacer,
            metrics: ServiceMetrics::new(),
            limiter,
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Budget for one request: the client's request capped at the configured maximum.
    pub fn effective_budget(&self, requested: Option<u64>) -> u64 {
        match requested {
            Some(requested) => requested.min(self.config.max_replacements),
            None => self.config.max_replacements,
        }
    }

    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}
