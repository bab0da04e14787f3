//! Structured error types for bankdesk-core.
//!
//! Collaborator failures (`FetchError`) and synchronous input rejections
//! (`ControlError`) are kept apart: the first kind ends up in the list
//! controller's `Failed` status, the second never touches controller state.
//! The binary crate wraps everything in `anyhow` for convenience.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a list or mutation collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The session token was rejected (HTTP 401). Triggers session teardown.
    #[error("session expired, please sign in again")]
    Unauthenticated,

    /// The signed-in user may not perform the request (HTTP 403).
    #[error("access denied: {0}")]
    Forbidden(String),

    /// The collaborator answered with a body of an unknown shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The requested page lies past the last one. The list controller
    /// clamps to `total_pages` and asks again.
    #[error("page {requested} exceeds total pages {total_pages}")]
    PageOutOfRange { requested: u32, total_pages: u32 },

    /// Transport failure or any other non-success status.
    #[error("{0}")]
    NetworkOrServer(String),
}

impl FetchError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::NetworkOrServer(reason.into())
    }

    /// Whether this failure must tear the session down.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Input rejected by the list controller before any state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("page size {size} is not one of {allowed:?}")]
    InvalidPageSize { size: u32, allowed: Vec<u32> },

    #[error("page {0} is out of range")]
    InvalidPageTarget(u32),

    #[error("unknown filter '{0}'")]
    UnknownFilter(String),
}

/// Configuration and session-store failures.
#[derive(Error, Debug)]
pub enum DeskError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file could not be parsed
    #[error("Invalid config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config file missing where one is required
    #[error("Config not found at {path:?}\n\nRun: bankdesk config init")]
    ConfigMissing { path: PathBuf },

    /// Config values are inconsistent
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Session file is not valid JSON
    #[error("Invalid session file {path:?}: {source}")]
    Session {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Home directory could not be determined
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Result type alias for bankdesk-core configuration operations
pub type Result<T> = std::result::Result<T, DeskError>;

impl DeskError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages() {
        assert_eq!(
            FetchError::forbidden("Admin access required").to_string(),
            "access denied: Admin access required"
        );
        assert_eq!(
            FetchError::network("500 Internal Server Error: boom").to_string(),
            "500 Internal Server Error: boom"
        );
        assert!(FetchError::Unauthenticated.is_unauthenticated());
        assert!(!FetchError::malformed("x").is_unauthenticated());
        assert_eq!(
            FetchError::PageOutOfRange {
                requested: 3,
                total_pages: 2
            }
            .to_string(),
            "page 3 exceeds total pages 2"
        );
    }

    #[test]
    fn control_error_lists_allowed_sizes() {
        let err = ControlError::InvalidPageSize {
            size: 7,
            allowed: vec![5, 10],
        };
        assert_eq!(err.to_string(), "page size 7 is not one of [5, 10]");
    }
}
