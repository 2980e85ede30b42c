//! Messaging endpoints for embedded apps.
//!
//! A child app talks to its host through a [`WatoneSdk`]; the host answers
//! through a [`ParentListener`]. Both sides exchange `{type, data}`
//! envelopes over windows from `watone-window`, dispatch inbound envelopes
//! to handlers registered by type, and can run a correlated
//! request/response exchange with [`request`].

pub mod error;
pub mod message;
pub mod parent;
pub mod registry;
pub mod request;
pub mod sdk;

pub use error::{PeerError, Result};
pub use message::{LoginInfo, NavigateParams};
pub use parent::{ParentConfig, ParentHandler, ParentListener};
pub use registry::HandlerRegistry;
pub use request::{request, Exchange, ReplySink, DEFAULT_REQUEST_TIMEOUT};
pub use sdk::{Handler, SdkConfig, WatoneSdk};

use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
