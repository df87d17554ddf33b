use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use json_swap_core::{TokenPair, MAX_NESTING_DEPTH};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Listen host address
    pub server_host: String,

    /// Listen port
    pub server_port: u16,

    /// Token searched for inside string values
    pub source_token: String,

    /// Token written in place of each match
    pub target_token: String,

    /// Replacement budget per request, also the cap for client overrides
    pub max_replacements: u64,

    /// Container nesting allowed below the root value
    pub max_depth: usize,

    /// Maximum request body size in bytes
    pub max_body_size_bytes: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Length of one rate-limit window in seconds
    pub rate_limit_window_secs: u64,

    /// Requests allowed per client within one window
    pub rate_limit_max_requests: u32,

    /// Upper bound on draining in-flight requests after a shutdown signal
    pub shutdown_grace_secs: u64,

    /// Log level
    pub log_level: String,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8190,
            source_token: "dog".to_string(),
            target_token: "cat".to_string(),
            max_replacements: 100,
            max_depth: 32,
            max_body_size_bytes: 1024 * 1024,
            request_timeout_secs: 10,
            rate_limit_window_secs: 60,
            rate_limit_max_requests: 100,
            shutdown_grace_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl SwapConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("SWAP_HOST") {
            if !host.trim().is_empty() {
                cfg.server_host = host;
            }
        }
        if let Some(port) = lookup("SWAP_PORT") {
            cfg.server_port = port.parse().context("SWAP_PORT must be a valid u16")?;
        }
        if let Some(token) = lookup("SOURCE_TOKEN") {
            cfg.source_token = token;
        }
        if let Some(token) = lookup("TARGET_TOKEN") {
            cfg.target_token = token;
        }
        if let Some(limit) = lookup("MAX_REPLACEMENTS") {
            cfg.max_replacements = limit
                .parse()
                .context("MAX_REPLACEMENTS must be a non-negative integer")?;
        }
        if let Some(depth) = lookup("MAX_DEPTH") {
            cfg.max_depth = depth
                .parse()
                .context("MAX_DEPTH must be a positive integer")?;
        }
        if let Some(size) = lookup("MAX_BODY_SIZE_BYTES") {
            cfg.max_body_size_bytes = size
                .parse()
                .context("MAX_BODY_SIZE_BYTES must be a positive integer")?;
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
            cfg.request_timeout_secs = timeout
                .parse()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?;
        }
        if let Some(window) = lookup("RATE_LIMIT_WINDOW_SECS") {
            cfg.rate_limit_window_secs = window
                .parse()
                .context("RATE_LIMIT_WINDOW_SECS must be a positive integer")?;
        }
        if let Some(max) = lookup("RATE_LIMIT_MAX_REQUESTS") {
            cfg.rate_limit_max_requests = max
                .parse()
                .context("RATE_LIMIT_MAX_REQUESTS must be a positive integer")?;
        }
        if let Some(grace) = lookup("SHUTDOWN_GRACE_SECS") {
            cfg.shutdown_grace_secs = grace
                .parse()
                .context("SHUTDOWN_GRACE_SECS must be a positive integer")?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            if !level.trim().is_empty() {
                cfg.log_level = level;
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_host.trim().is_empty() {
            anyhow::bail!("SWAP_HOST cannot be empty");
        }
        if self.source_token.is_empty() {
            anyhow::bail!("SOURCE_TOKEN cannot be empty");
        }
        if self.max_depth == 0 {
            anyhow::bail!("MAX_DEPTH must be greater than zero");
        }
        if self.max_depth > MAX_NESTING_DEPTH {
            anyhow::bail!("MAX_DEPTH cannot exceed {}", MAX_NESTING_DEPTH);
        }
        if self.max_body_size_bytes == 0 {
            anyhow::bail!("MAX_BODY_SIZE_BYTES must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if self.rate_limit_window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }
        if self.rate_limit_max_requests == 0 {
            anyhow::bail!("RATE_LIMIT_MAX_REQUESTS must be greater than zero");
        }
        if self.shutdown_grace_secs == 0 {
            anyhow::bail!("SHUTDOWN_GRACE_SECS must be greater than zero");
        }

        Ok(())
    }

    pub fn token_pair(&self) -> Result<TokenPair> {
        TokenPair::new(self.source_token.clone(), self.target_token.clone())
            .context("invalid token configuration")
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Get the listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
