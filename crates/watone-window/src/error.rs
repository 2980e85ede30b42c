use std::time::Duration;

/// Errors raised while creating or bridging windows.
///
/// Posting a message never fails: undeliverable posts are logged and
/// dropped, like the browser primitive they stand in for.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The origin string is not usable.
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    /// The event loop thread could not be started.
    #[error("failed to start window event loop: {0}")]
    Spawn(std::io::Error),

    /// Socket-level error while bridging.
    #[error("transport error: {0}")]
    Transport(#[from] watone_transport::TransportError),

    /// Frame-level error while bridging.
    #[error("frame error: {0}")]
    Frame(#[from] watone_frame::FrameError),

    /// The bridge peer sent something other than a valid hello.
    #[error("bridge handshake failed: {0}")]
    Handshake(String),

    /// The bridge peer did not say hello in time.
    #[error("bridge handshake timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, WindowError>;
