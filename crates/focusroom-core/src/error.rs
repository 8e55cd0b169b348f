//! Core error types for focusroom-core.
//!
//! Storage failures are recovered where the capability is called and only
//! surface here so backends and helpers have something typed to return.
//! Input errors (`InvalidDuration`, unknown ids, bad settings) go back to
//! the caller.

use thiserror::Error;

/// Core error type for focusroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// `set_duration` was given a non-positive number of seconds.
    #[error("Invalid duration: {seconds}s (must be greater than zero)")]
    InvalidDuration { seconds: i64 },

    /// No achievement with this id exists in the catalog.
    #[error("Unknown achievement: {0}")]
    UnknownAchievement(String),

    /// The background driver task is gone.
    #[error("Timer driver has stopped")]
    DriverStopped,

    /// Key/value store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Settings key errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend could not be read or written (quota, lock, sqlite failure).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored value failed to parse or failed validation.
    #[error("Malformed persisted state for '{key}': {message}")]
    Malformed { key: String, message: String },
}

/// Configuration key errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Dot-path does not name a settings field
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    /// Value could not be parsed into the field's type
    #[error("Cannot parse '{value}' for settings key '{key}'")]
    ParseFailed { key: String, value: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg)
                if code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Unavailable("database is locked".into())
            }
            _ => StorageError::Unavailable(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
