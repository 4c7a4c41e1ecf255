//! Error types for SlateKV
//!
//! A single unified error type covers all engine components. Two tiers:
//! `Transaction` and `Command` are soft errors, meaning the caller reports
//! the message and keeps going with engine state unchanged. Everything else
//! propagates; `Recovery` in particular is fatal at startup.

use thiserror::Error;

/// Result type alias for SlateKV operations
pub type Result<T> = std::result::Result<T, SlateError>;

/// Unified error type for SlateKV operations
#[derive(Debug, Error)]
pub enum SlateError {
    /// I/O error (log or snapshot file operations)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A log line that does not follow the entry format
    #[error("malformed log entry: {0}")]
    LogFormat(String),

    /// A snapshot file that cannot be read back
    #[error("malformed snapshot: {0}")]
    Snapshot(String),

    /// Unknown or duplicate transaction id (soft; the engine stays live)
    #[error("{0}")]
    Transaction(String),

    /// Malformed client command (soft; the engine stays live)
    #[error("{0}")]
    Command(String),

    /// The durable log is structurally inconsistent with the master record
    #[error("recovery failed: {0}")]
    Recovery(String),
}
