//! Core error types for pawcue-core.
//!
//! The generator signals an infeasible session shape with an empty schedule;
//! callers that need to refuse it use [`CoreError::Infeasible`]. The types
//! here cover configuration files, form-level validation, notification
//! backends and the async driver.

use std::path::PathBuf;
use thiserror::Error;

use crate::reminder::ScheduleConfiguration;

/// Core error type for pawcue-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session shape cannot fit its repetitions
    #[error(
        "{} repetitions of {}s do not fit in {}s",
        .0.count,
        .0.avg_duration_secs,
        .0.total_time_secs
    )]
    Infeasible(ScheduleConfiguration),

    /// The reminder driver task has shut down
    #[error("Reminder driver is no longer running")]
    DriverClosed,
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

    /// Home/config directory could not be prepared
    #[error("Config directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value must be a finite number greater than zero
    #[error("'{field}' must be a positive number (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    /// Value must be a finite number not below zero
    #[error("'{field}' must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Notification delivery errors.
///
/// These never leave the notification layer; they are logged and dropped.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The platform has no such capability
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    /// Audio output could not be opened or played
    #[error("Audio output failed: {0}")]
    Audio(String),

    /// Writing the terminal bell failed
    #[error("Terminal write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
