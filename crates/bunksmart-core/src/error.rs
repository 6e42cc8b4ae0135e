//! Core error types for bunksmart-core.
//!
//! Errors are grouped by the taxonomy the engine reports to its callers:
//! store failures, precondition failures, malformed imports, and
//! validation/configuration problems. A missing identity is not an error;
//! the engine logs it and skips the operation.

use std::path::PathBuf;
use thiserror::Error;

use crate::challenge::ChallengeId;

/// Core error type for bunksmart-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Challenge check-in preconditions
    #[error("{0}")]
    CheckIn(#[from] CheckInError),

    /// Rejected import payloads
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export failures
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`RecordStore`](crate::store::RecordStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the local database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Remote document store could not be reached
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote document store answered with a non-success status
    #[error("Remote store returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// Remote store rejected the credentials
    #[error("Remote store rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Stored document could not be decoded
    #[error("Corrupt document for user '{user}': {message}")]
    CorruptDocument { user: String, message: String },

    /// Background task failed before finishing
    #[error("Store task failed: {0}")]
    Task(String),
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Date-key is not a valid `YYYY-MM-DD` calendar date
    #[error("Invalid date key '{0}': expected YYYY-MM-DD")]
    InvalidDateKey(String),

    /// Month outside 0..=11
    #[error("Invalid month {0}: expected 0..=11")]
    InvalidMonth(u32),

    /// Unknown attendance status
    #[error("Invalid attendance status '{0}': expected present or bunked")]
    InvalidStatus(String),

    /// Unknown challenge identifier
    #[error("Unknown challenge '{0}'")]
    UnknownChallenge(String),

    /// Unknown user setting key
    #[error("Unknown setting '{0}'")]
    UnknownSetting(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Precondition failures for a challenge check-in. Nothing is mutated when
/// one of these is returned.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CheckInError {
    /// Today has no record, or it is not a present mark
    #[error("You must mark today as present in attendance to check in!")]
    NotPresentToday,

    /// The challenge has not been started
    #[error("Challenge '{0}' is not active")]
    NotActive(ChallengeId),
}

/// Import payload rejections. Validation happens before any mutation.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Payload is not JSON
    #[error("Error importing data. Please check the file format. ({0})")]
    Parse(#[from] serde_json::Error),

    /// Payload has none of the recognized top-level keys
    #[error("Invalid data format. Please select a valid Bunk Smart export file.")]
    UnrecognizedFormat,

    /// A recognized section has the wrong shape
    #[error("Invalid '{section}' section: {message}")]
    InvalidSection { section: &'static str, message: String },
}

/// Export failures.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Attendance map is empty
    #[error("No data to export.")]
    NoData,

    /// CSV writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
