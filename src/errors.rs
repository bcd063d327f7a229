//! Error types for the simulator
//!
//! This module defines [`SimError`], which represents every way a single command
//! can fail, and [`StorageError`] for problems with the persisted state files.
//!
//! All errors are terminal for the command that raised them: the dispatcher only
//! persists state after an operation succeeds, so a failed command never leaves a
//! partial mutation behind. Errors are rendered to text only at the process
//! boundary, through their `Display` implementations.

use crate::memory::Pid;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while executing a command
#[derive(Debug, Error)]
pub enum SimError {
    /// Requested size is zero, negative or not a number
    #[error("Invalid size '{0}': size must be a positive integer")]
    InvalidSize(String),

    /// No free range is large enough for the request
    #[error("Out of memory: requested {requested}, largest free range is {largest_free} ({free} free in total)")]
    OutOfMemory {
        requested: u64,
        largest_free: u64,
        free: u64,
    },

    /// No allocated block carries this pid
    #[error("PID {0} not found")]
    NotFound(Pid),

    /// Self-relation, malformed endpoint, or endpoint rejected by the relation policy
    #[error("Invalid relation {from} -> {to}: {reason}")]
    InvalidRelation {
        from: String,
        to: String,
        reason: String,
    },

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Another invocation held the state lock for too long
    #[error("Timed out after {waited_ms} ms waiting for state lock {}", .path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    /// Unknown command, wrong argument count, or malformed pid
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl SimError {
    pub(crate) fn invalid_relation(from: impl ToString, to: impl ToString, reason: &str) -> Self {
        SimError::InvalidRelation {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether retrying the same command later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, SimError::LockTimeout { .. })
    }
}

/// Errors raised by a [`StateStore`](crate::store::StateStore)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold a valid state
    #[error("{} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StorageError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
