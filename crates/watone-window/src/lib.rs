//! Window messaging runtime.
//!
//! The primitive the SDK endpoints are built on: a window can post a JSON
//! message to another window, subject to a target-origin check, and every
//! window delivers inbound messages to its listeners from its own event
//! loop, one at a time and in arrival order.
//!
//! - [`LocalWindow`]: a window owned by this process, with listeners
//! - [`Window`]: a postable handle to a local or bridged window
//! - [`bridge`]: connect windows living in different processes

pub mod error;
pub mod event;
pub mod origin;
mod remote;
pub mod window;

#[cfg(unix)]
pub mod bridge;

pub use error::{Result, WindowError};
pub use event::{Listener, ListenerId, MessageEvent};
pub use origin::TargetOrigin;
pub use window::{LocalWindow, Subscription, WeakWindow, Window};

#[cfg(unix)]
pub use bridge::{connect, connect_with_config, BridgeConfig, WindowServer};
