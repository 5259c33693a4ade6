//! Core error types for kamatis-core.
//!
//! Errors are scarce in the core: the scheduler only reports rejected
//! transitions, while settings and autostart report file and parse failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::SchedulerState;

/// Core error type for kamatis-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scheduler transition errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Autostart entry could not be written or removed
    #[error("Cannot {action} autostart file {path}: {source}")]
    Autostart {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Rejected scheduler commands.
///
/// The front end only offers commands that are valid for the current state,
/// so these are caller bugs. The scheduler is left untouched when one is
/// returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SchedulerState,
        action: &'static str,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
