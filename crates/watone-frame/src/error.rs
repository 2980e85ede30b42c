/// Errors that can occur while framing or unframing bridge traffic.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header does not start with the "WT" magic.
    #[error("invalid frame magic (expected 0x5754 \"WT\")")]
    InvalidMagic,

    /// The body exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The frame body is not a valid wire message.
    #[error("invalid frame body: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
