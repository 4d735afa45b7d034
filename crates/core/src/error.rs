//! Unified error types for the cache controller.
//!
//! Every message starts with a stable upper-case code so host tooling can
//! match on it without parsing the detail.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error type shared by the controller, storage and hosts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown request mode).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be parsed or resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Live fetch failed at the transport layer.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// No live response and no cached fallback for the request.
    #[error("NO_RESPONSE: {0}")]
    NoResponse(String),

    /// A precache manifest URL could not be fetched.
    #[error("INSTALL_FAILED: {url}: {reason}")]
    InstallFailed { url: String, reason: String },

    /// Lifecycle event arrived for a generation in the wrong state.
    #[error("INVALID_STATE: generation {version} is {actual}, expected {expected}")]
    InvalidState { version: String, expected: String, actual: String },

    /// Push payload is present but not valid JSON.
    #[error("INVALID_PAYLOAD: {0}")]
    InvalidPayload(String),

    /// Host shell operation (window, notification) failed.
    #[error("HOST_ERROR: {0}")]
    Host(String),

    /// Unknown partition, window or notification.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) | Error::InvalidUrl(_) | Error::InvalidPayload(_) => -32602,
            Error::NoResponse(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) => -32002,
            Error::Network(_) => -32003,
            Error::InstallFailed { .. } => -32004,
            Error::InvalidState { .. } => -32005,
            Error::Host(_) => -32006,
            Error::NotFound(_) => -32007,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
