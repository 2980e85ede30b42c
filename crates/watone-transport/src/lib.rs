//! Local socket transport for bridging windows across processes.
//!
//! Windows living in the same process talk through their event loops
//! directly. When the embedding host and the embedded app run in different
//! processes, their windows are bridged over a Unix domain socket, and this
//! crate provides the connected [`IpcStream`] that the bridge frames
//! messages onto.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use traits::IpcStream;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
