//! Client-side configuration for Hustle Hub.
//!
//! - [`LocalStorage`]: durable key/value storage for the workspace selection
//! - [`SyncConfig`] / [`AssistConfig`]: tunables loaded from environment variables

use thiserror::Error;

mod settings;
mod storage;

pub use settings::*;
pub use storage::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    NoHomeDir,
    #[error("Failed to read local state: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse local state: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {var}: {value}")]
    InvalidNumber { var: String, value: String },
    #[error("{var} must be at most {max}, got {value}")]
    OutOfRange { var: String, value: usize, max: usize },
    #[error("Local state lock poisoned")]
    Poisoned,
}
