//! Core error types for debate-tutor-core.
//!
//! This module defines the error hierarchy using thiserror. Every public
//! operation of the library returns [`Result`], so the CLI can report the
//! specific unmet constraint instead of a generic failure.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for debate-tutor-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Bad input shape or range
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// External service response not structured as expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown scenario id
    #[error("Scenario not found: {id}")]
    NotFound { id: String },

    /// Ownership mismatch or missing caller identity
    #[error("Unauthorized: {0}")]
    Authorization(String),

    /// External service or storage unreachable or erroring
    #[error("Upstream error from '{service}': {message}")]
    Upstream {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        CoreError::Upstream {
            service: service.to_string(),
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(id: &str) -> Self {
        CoreError::NotFound { id: id.to_string() }
    }

    /// Process exit code for the CLI adapter.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Validation(_) => 2,
            CoreError::NotFound { .. } => 3,
            CoreError::Authorization(_) => 4,
            CoreError::Parse(_) | CoreError::Upstream { .. } => 5,
            _ => 1,
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Two siblings share an id
    #[error("Duplicate id '{id}' in {collection}")]
    DuplicateId { collection: String, id: String },
}

impl ValidationError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn out_of_bounds(collection: &str, index: usize, len: usize) -> Self {
        ValidationError::OutOfBounds {
            collection: collection.to_string(),
            index,
            len,
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        CoreError::Upstream {
            service: "http".to_string(),
            message,
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
