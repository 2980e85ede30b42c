//! Cross-window messaging for embedded apps.
//!
//! An embedded app (the child) and the page hosting it (the parent)
//! exchange `{type, data}` envelopes through windows. The child asks for
//! login info, requests navigation or hands data to the host; the host
//! answers from a [`peer::ParentListener`].
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain sockets used to bridge windows
//! - [`frame`]: envelopes, message types and the bridge wire format
//! - [`window`]: local windows, event loops and cross-process bridges
//! - [`peer`]: `WatoneSdk`, `ParentListener` and request/response (behind `peer`)

/// Re-export transport types.
pub mod transport {
    pub use watone_transport::*;
}

/// Re-export envelope and framing types.
pub mod frame {
    pub use watone_frame::*;
}

/// Re-export the window runtime.
pub mod window {
    pub use watone_window::*;
}

/// Re-export the messaging endpoints (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use watone_peer::*;
}
