//! Core error types for flapjack-core.
//!
//! The countdown engine itself never fails. Everything that can fail lives
//! at the edges: the challenge store, configuration files and the mutation
//! commands issued by the admin view.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for flapjack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Challenge store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A mutation command was refused before reaching the store
    #[error("Command rejected: {0}")]
    Command(#[from] CommandError),
}

/// Challenge store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// The store has been shut down and accepts no more writes
    #[error("Store is closed")]
    Closed,
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
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Reasons a mutation command is refused without touching the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Challenge already in progress")]
    AlreadyActive,

    #[error("Reset not confirmed")]
    NotConfirmed,

    #[error("'{identity}' is not allowed to modify the challenge")]
    NotAuthorized { identity: String },
}

/// A food item token that names no counter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown food item '{0}' (expected pancake, bacon, sausage or helper)")]
pub struct UnknownFoodItem(pub String);

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
