//! Error types for gallery-fetch
//!
//! This module separates failures by how far they reach:
//! - [`FetchError`] - a single failed attempt, always retried locally
//! - [`SinkError`] - a single entry that could not be written, never fatal to the run
//! - [`Error`] - setup and collaborator failures that abort a run before it starts

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gallery-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gallery-fetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "workers")
        key: Option<String>,
    },

    /// The output destination could not be created or finalized
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Gallery or base URL resolution failed
    #[error("resolve error: {0}")]
    Resolve(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of item fetching (client construction, resolvers)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A pipeline task panicked or was aborted
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Outcome of a single failed fetch attempt
///
/// The retry policy treats every variant the same way; the distinction only
/// exists for logging.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Server answered successfully but without a payload
    #[error("empty response body")]
    EmptyBody,
}

/// Errors raised by an output sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination container could not be created
    #[error("failed to create {path}: {source}")]
    Create {
        /// The archive file or directory that could not be created
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Entry name would escape the destination or is otherwise unusable
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidEntryName {
        /// The rejected entry name
        name: String,
        /// Why the name was rejected
        reason: &'static str,
    },

    /// Writing an entry failed
    #[error("failed to write entry {name:?}: {source}")]
    Write {
        /// The entry being written
        name: String,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Zip writer failure
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Flushing or closing the destination failed
    #[error("failed to finalize {path}: {source}")]
    Finish {
        /// The archive file or directory being finalized
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}
