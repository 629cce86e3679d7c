//! Error types for the settings crate.
//!
//! This module provides structured error types for laser card configuration
//! loading, saving, and validation.

use std::io;
use thiserror::Error;

/// Errors that can occur during settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be loaded.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// The configuration file could not be saved.
    #[error("Failed to save settings: {0}")]
    SaveError(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to configuration validation.
///
/// Every variant is fatal: a configuration that fails validation is
/// rejected before any region is compiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric field is missing, non-finite, or outside its valid range.
    #[error("Invalid value for '{key}': {value} ({reason})")]
    InvalidValue {
        key: String,
        value: f64,
        reason: String,
    },

    /// The power correction table cannot be interpolated.
    #[error("Power correction table needs at least 2 entries, got {len}")]
    CorrectionTableTooShort { len: usize },

    /// The power correction table decreases somewhere.
    #[error("Power correction table must be non-decreasing (entry {index})")]
    CorrectionTableNotMonotonic { index: usize },

    /// No speed profiles were configured.
    #[error("No speed profiles configured")]
    NoSpeedProfiles,

    /// Two speed profiles share a mark speed.
    #[error("Duplicate speed profile for mark speed {mark_speed}")]
    DuplicateSpeedProfile { mark_speed: u32 },

    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(key: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value,
            reason: reason.into(),
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
