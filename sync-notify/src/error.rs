//! Error types for the sync-notify crate.

/// Errors raised while decoding an inbound notification frame.
///
/// These never escape the streaming worker; it logs them and drops the frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON
    #[error("Malformed notification payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload parsed, but its root is not a JSON object
    #[error("Notification payload root is not an object")]
    NotAnObject,
}

/// Convenience type alias for Results using DecodeError.
pub type Result<T> = std::result::Result<T, DecodeError>;
