//! Tunables loaded from environment variables.
//!
//! ```bash
//! # Sync engine
//! HUB_INITIAL_LOAD_WINDOW_MS=2500   # history replay window after subscribing
//! HUB_NOTIFICATION_TTL_MS=5000      # lifetime of each notification
//! HUB_NOTIFICATION_CAP=5            # max notifications kept
//!
//! # Assistant
//! HUB_ASSIST_API_KEY=...
//! HUB_ASSIST_MODEL=gemini-2.0-flash
//! HUB_ASSIST_ENDPOINT=https://generativelanguage.googleapis.com
//! ```

use std::env;
use std::time::Duration;

use crate::ConfigError;

pub const DEFAULT_INITIAL_LOAD_WINDOW: Duration = Duration::from_millis(2500);
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);
pub const DEFAULT_NOTIFICATION_CAP: usize = 5;

pub const DEFAULT_ASSIST_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ASSIST_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

fn parse_var<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// The cap may be lowered but never raised past the default.
fn notification_cap() -> Result<Option<usize>, ConfigError> {
    const VAR: &str = "HUB_NOTIFICATION_CAP";
    match parse_var::<usize>(VAR)? {
        Some(cap) if cap > DEFAULT_NOTIFICATION_CAP => Err(ConfigError::OutOfRange {
            var: VAR.to_string(),
            value: cap,
            max: DEFAULT_NOTIFICATION_CAP,
        }),
        cap => Ok(cap),
    }
}

/// Sync engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long after opening subscriptions deliveries count as history replay.
    pub initial_load_window: Duration,
    /// How long each notification stays visible.
    pub notification_ttl: Duration,
    /// Maximum number of notifications kept at once.
    pub notification_cap: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_load_window: DEFAULT_INITIAL_LOAD_WINDOW,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
            notification_cap: DEFAULT_NOTIFICATION_CAP,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            initial_load_window: parse_var::<u64>("HUB_INITIAL_LOAD_WINDOW_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_load_window),
            notification_ttl: parse_var::<u64>("HUB_NOTIFICATION_TTL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.notification_ttl),
            notification_cap: notification_cap()?.unwrap_or(defaults.notification_cap),
        })
    }
}

/// Generative-text service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistConfig {
    /// API key; may be empty when the endpoint injects credentials itself.
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_ASSIST_MODEL.to_string(),
            endpoint: DEFAULT_ASSIST_ENDPOINT.to_string(),
        }
    }
}

impl AssistConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("HUB_ASSIST_API_KEY").unwrap_or(defaults.api_key),
            model: env::var("HUB_ASSIST_MODEL").unwrap_or(defaults.model),
            endpoint: env::var("HUB_ASSIST_ENDPOINT").unwrap_or(defaults.endpoint),
        }
    }

    /// Full URL of the `generateContent` call for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}
