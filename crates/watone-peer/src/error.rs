use std::time::Duration;

/// Errors surfaced by the messaging endpoints.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The caller passed an argument the operation cannot use.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No reply of the expected type arrived in time.
    #[error("no {reply_type} received within {timeout:?}")]
    Timeout {
        reply_type: String,
        timeout: Duration,
    },

    /// The parent has not heard from any child window yet.
    #[error("no child window connected")]
    NoPeerConnected,

    /// A typed payload could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PeerError>;
