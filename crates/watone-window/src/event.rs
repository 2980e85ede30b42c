use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::window::Window;

/// One inbound message, as seen by a window's listeners.
#[derive(Clone)]
pub struct MessageEvent {
    /// The posted value, untouched.
    pub data: Value,
    /// Origin of the window that posted it. Empty for synthetic events.
    pub origin: String,
    /// The posting window, usable as a reply target. `None` for synthetic
    /// events dispatched directly on a window.
    pub source: Option<Window>,
}

impl MessageEvent {
    /// An event with no sender, as produced by [`crate::LocalWindow::dispatch_event`].
    pub fn synthetic(data: Value) -> Self {
        Self {
            data,
            origin: String::new(),
            source: None,
        }
    }
}

impl fmt::Debug for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageEvent")
            .field("data", &self.data)
            .field("origin", &self.origin)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// Callback invoked on the window's event loop for every inbound message.
pub type Listener = Arc<dyn Fn(&MessageEvent) + Send + Sync>;

/// Handle returned by [`crate::LocalWindow::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
