//! Host-side endpoint.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use watone_frame::Envelope;
use watone_window::{LocalWindow, MessageEvent, Subscription, TargetOrigin, WeakWindow, Window};

use crate::error::{PeerError, Result};
use crate::lock;
use crate::registry::HandlerRegistry;
use crate::request::{request, Exchange, ReplySink};

/// Callback signature for host handlers: payload and the posting window.
pub type ParentHandlerFn = dyn Fn(Option<&Value>, Option<&Window>) + Send + Sync;
pub type ParentHandler = Arc<ParentHandlerFn>;

#[derive(Debug, Clone, Default)]
pub struct ParentConfig {
    /// Log every inbound and outbound envelope at debug level.
    pub debug: bool,
}

impl ParentConfig {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

struct Shared {
    registry: Mutex<HandlerRegistry<ParentHandlerFn>>,
    child: Mutex<Option<WeakWindow>>,
    debug: bool,
}

impl Shared {
    fn handle_event(&self, event: &MessageEvent) {
        if self.debug {
            debug!(origin = %event.origin, data = %event.data, "parent received message");
        }

        // Remember the sender first so handlers can answer with send_to_child.
        if let Some(source) = &event.source {
            let mut child = lock(&self.child);
            if !child.as_ref().is_some_and(|known| known.points_to(source)) {
                if self.debug {
                    debug!(origin = %source.origin(), "child window changed");
                }
                *child = Some(source.downgrade());
            }
        }

        let Some(envelope) = Envelope::from_value(&event.data) else {
            return;
        };
        let handlers = lock(&self.registry).take_for_dispatch(&envelope.msg_type);
        for handler in handlers {
            handler(envelope.data.as_ref(), event.source.as_ref());
        }
    }

    fn child(&self) -> Option<Window> {
        lock(&self.child)
            .as_ref()
            .and_then(WeakWindow::upgrade)
            .filter(|window| !window.is_closed())
    }
}

/// Listens for messages from an embedded app.
///
/// Holds at most one handler per message type; registering again replaces
/// it. The window that posted most recently becomes the target of
/// [`ParentListener::send_to_child`].
pub struct ParentListener {
    shared: Arc<Shared>,
    window: LocalWindow,
    subscription: Mutex<Option<Subscription>>,
}

impl ParentListener {
    pub fn new(window: &LocalWindow, config: ParentConfig) -> Self {
        let shared = Arc::new(Shared {
            registry: Mutex::new(HandlerRegistry::new()),
            child: Mutex::new(None),
            debug: config.debug,
        });
        let listener_state = Arc::clone(&shared);
        let subscription =
            window.subscribe(Arc::new(move |event: &MessageEvent| listener_state.handle_event(event)));

        Self {
            shared,
            window: window.clone(),
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Set the handler for `msg_type`, replacing any previous one.
    pub fn on(&self, msg_type: &str, handler: ParentHandler) -> &Self {
        lock(&self.shared.registry).replace(msg_type, handler);
        self
    }

    /// Set a handler that runs for the next `msg_type` message only.
    pub fn once(&self, msg_type: &str, handler: ParentHandler) -> &Self {
        lock(&self.shared.registry).replace_once(msg_type, handler);
        self
    }

    /// Remove the handler for `msg_type`.
    pub fn off(&self, msg_type: &str) -> &Self {
        lock(&self.shared.registry).remove_all(msg_type);
        self
    }

    /// Post `{type, data}` to the last window that messaged us.
    ///
    /// Always posts with the `*` target origin.
    pub fn send_to_child(&self, msg_type: &str, data: Option<Value>) -> Result<()> {
        self.post(&Envelope::with_data(msg_type, data))
    }

    /// Send `request_type` to the child and wait for `reply_type`.
    pub async fn request(
        &self,
        request_type: &str,
        reply_type: &str,
        payload: Option<Value>,
        timeout: Duration,
    ) -> Result<Option<Value>> {
        request(self, request_type, reply_type, payload, timeout).await
    }

    /// Stop listening, drop handlers and forget the child.
    pub fn destroy(&self) {
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.unsubscribe();
        }
        lock(&self.shared.registry).clear();
        *lock(&self.shared.child) = None;
        if self.shared.debug {
            debug!(window = %self.window.origin(), "parent listener destroyed");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.shared.child().is_some()
    }

    /// The current reply target, if any.
    pub fn child(&self) -> Option<Window> {
        self.shared.child()
    }

    pub fn has_handlers(&self, msg_type: &str) -> bool {
        lock(&self.shared.registry).contains(msg_type)
    }

    pub fn handler_count(&self, msg_type: &str) -> usize {
        lock(&self.shared.registry).count(msg_type)
    }

    pub fn registered_types(&self) -> Vec<String> {
        lock(&self.shared.registry).types()
    }

    pub fn window(&self) -> &LocalWindow {
        &self.window
    }

    fn post(&self, envelope: &Envelope) -> Result<()> {
        let child = self.shared.child().ok_or(PeerError::NoPeerConnected)?;
        let message = envelope.to_value();
        if self.shared.debug {
            debug!(child = %child.origin(), %message, "parent sending message");
        }
        self.window.post_to(&child, message, &TargetOrigin::Any);
        Ok(())
    }
}

impl Exchange for ParentListener {
    type ReplyHandle = ParentHandler;

    fn expect_reply(&self, reply_type: &str, sink: ReplySink) -> ParentHandler {
        let handler: ParentHandler = Arc::new(move |data: Option<&Value>, _: Option<&Window>| sink(data));
        lock(&self.shared.registry).replace_once(reply_type, Arc::clone(&handler));
        handler
    }

    fn cancel_reply(&self, reply_type: &str, handle: &ParentHandler) {
        // Only remove our own entry; a later `on` may have replaced it.
        lock(&self.shared.registry).remove_one(reply_type, handle);
    }

    fn send_envelope(&self, envelope: Envelope) -> Result<()> {
        self.post(&envelope)
    }
}

impl fmt::Debug for ParentListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentListener")
            .field("window", &self.window.origin())
            .field("connected", &self.is_connected())
            .field("handlers", &*lock(&self.shared.registry))
            .finish()
    }
}
