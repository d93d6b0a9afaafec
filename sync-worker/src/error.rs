//! Error types for the sync-worker crate.
//!
//! None of these cross the `start()`/`stop()` boundary. The background task
//! logs them and stops itself.

/// Errors from the notification stream transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("Failed to connect to {url}: {reason}")]
    Connect {
        /// Endpoint that was dialled, with the token redacted
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// The open connection failed while reading
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Errors raised while preparing or running a sync session.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The client address could not be parsed as a URL
    #[error("Invalid client address '{address}': {reason}")]
    InvalidAddress {
        /// The address as supplied
        address: String,
        /// Why parsing failed
        reason: String,
    },

    /// The client address scheme has no stream equivalent
    #[error("Unsupported address scheme: {0}")]
    UnsupportedScheme(String),

    /// An error occurred in the stream transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The worker thread or its runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Convenience type alias for Results using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;
