//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::core::document::PollPolicy;
use crate::core::errors::{Result, TranslationError};

/// Configuration for the translation client
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub auth_key: String,
    pub use_free_api: bool,
    /// Overrides both fixed base URLs when set
    pub server_url: Option<String>,
    pub timeout_ms: u64,
    /// Budget for document uploads and downloads, body included
    pub transfer_timeout_ms: u64,
    pub poll: PollPolicy,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("auth_key", &"<redacted>")
            .field("use_free_api", &self.use_free_api)
            .field("server_url", &self.server_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("transfer_timeout_ms", &self.transfer_timeout_ms)
            .field("poll", &self.poll)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_key: String::new(),
            use_free_api: false,
            server_url: None,
            timeout_ms: 30000,
            transfer_timeout_ms: 600000,
            poll: PollPolicy::default(),
        }
    }
}

/// Read an optional numeric variable, failing on garbage rather than ignoring it
fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| TranslationError::ConfigError {
                message: format!("{} must be a number: {}", name, e),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl ClientConfig {
    pub fn new(auth_key: impl Into<String>, use_free_api: bool) -> Self {
        Self {
            auth_key: auth_key.into(),
            use_free_api,
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let auth_key = std::env::var("DEEPL_AUTH_KEY").map_err(|_| TranslationError::ConfigError {
            message: "DEEPL_AUTH_KEY environment variable is required".to_string(),
        })?;

        let mut config = Self::new(auth_key, false);

        if let Ok(flag) = std::env::var("DEEPL_USE_FREE_API") {
            config.use_free_api = parse_flag(&flag);
        }

        if let Ok(url) = std::env::var("DEEPL_SERVER_URL") {
            if !url.trim().is_empty() {
                config.server_url = Some(url.trim().to_string());
            }
        }

        if let Some(timeout_ms) = env_u64("DEEPL_TIMEOUT_MS")? {
            config.timeout_ms = timeout_ms;
        }

        if let Some(transfer_timeout_ms) = env_u64("DEEPL_TRANSFER_TIMEOUT_MS")? {
            config.transfer_timeout_ms = transfer_timeout_ms;
        }

        if let Some(interval) = env_u64("DEEPL_POLL_INTERVAL_MS")? {
            config.poll.default_interval = Duration::from_millis(interval);
        }

        if let Some(cap) = env_u64("DEEPL_MAX_POLL_INTERVAL_MS")? {
            config.poll.max_interval = Some(Duration::from_millis(cap));
        }

        info!(
            "Loaded client configuration (free api: {}, custom server: {})",
            config.use_free_api,
            config.server_url.is_some()
        );

        Ok(config)
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_transfer_timeout_ms(mut self, transfer_timeout_ms: u64) -> Self {
        self.transfer_timeout_ms = transfer_timeout_ms;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(TranslationError::ConfigError {
                message: message.to_string(),
            })
        };

        if self.auth_key.trim().is_empty() {
            return fail("auth key is required");
        }

        if self.timeout_ms == 0 {
            return fail("timeout_ms must be greater than 0");
        }

        if self.transfer_timeout_ms == 0 {
            return fail("transfer_timeout_ms must be greater than 0");
        }

        if self.poll.default_interval.is_zero() {
            return fail("poll interval must be greater than 0");
        }

        if let Some(cap) = self.poll.max_interval {
            if cap < self.poll.default_interval {
                return fail("max poll interval must not be smaller than the default interval");
            }
        }

        Ok(())
    }
}
