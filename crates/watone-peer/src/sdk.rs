//! Child-side endpoint.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use watone_frame::{
    Envelope, GET_LOGIN_INFO, LOGIN_INFO_RESPONSE, LOGOUT, LOGOUT_RESPONSE, NAVIGATE, SEND_DATA,
};
use watone_window::{LocalWindow, MessageEvent, Subscription, TargetOrigin, Window};

use crate::error::{PeerError, Result};
use crate::lock;
use crate::message::{LoginInfo, NavigateParams};
use crate::registry::HandlerRegistry;
use crate::request::{request, Exchange, ReplySink};

/// Callback signature for child handlers: receives the envelope payload.
pub type HandlerFn = dyn Fn(Option<&Value>) + Send + Sync;
/// Shared child handler. `off` matches on `Arc` identity.
pub type Handler = Arc<HandlerFn>;

/// Construction options for [`WatoneSdk`].
#[derive(Debug, Clone, Default)]
pub struct SdkConfig {
    /// Log every inbound and outbound envelope at debug level.
    pub debug: bool,
    /// Target origin for posts to the parent. Defaults to the parent
    /// window's own origin.
    pub parent_origin: Option<TargetOrigin>,
    /// Drop inbound messages that do not come from the parent's origin.
    pub verify_origin: bool,
}

impl SdkConfig {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_parent_origin(mut self, origin: TargetOrigin) -> Self {
        self.parent_origin = Some(origin);
        self
    }

    pub fn with_verify_origin(mut self, verify: bool) -> Self {
        self.verify_origin = verify;
        self
    }
}

/// State reachable from the window listener. Holds no window handles so
/// the listener never keeps either window alive.
struct Shared {
    registry: Mutex<HandlerRegistry<HandlerFn>>,
    debug: bool,
    expected_origin: Option<String>,
}

impl Shared {
    fn handle_event(&self, event: &MessageEvent) {
        if let Some(expected) = &self.expected_origin {
            if event.origin != *expected {
                if self.debug {
                    warn!(origin = %event.origin, %expected, "message from unexpected origin dropped");
                }
                return;
            }
        }

        if self.debug {
            debug!(data = %event.data, "sdk received message");
        }

        let Some(envelope) = Envelope::from_value(&event.data) else {
            return;
        };
        let handlers = lock(&self.registry).take_for_dispatch(&envelope.msg_type);
        for handler in handlers {
            handler(envelope.data.as_ref());
        }
    }
}

/// The embedded app's connection to its host window.
///
/// Messages go to the parent window given at construction; messages
/// arriving on the app's own window are dispatched to the handlers
/// registered for their `type`, in registration order.
pub struct WatoneSdk {
    shared: Arc<Shared>,
    window: LocalWindow,
    parent: Window,
    target_origin: TargetOrigin,
    subscription: Mutex<Option<Subscription>>,
}

impl WatoneSdk {
    /// Attach to `window`, talking to `parent`.
    pub fn new(window: &LocalWindow, parent: Window, config: SdkConfig) -> Self {
        let target_origin = config
            .parent_origin
            .unwrap_or_else(|| TargetOrigin::exact(parent.origin()));
        // A wildcard target says nothing about who may answer: check inbound
        // messages against the parent's real origin instead.
        let expected_origin = config.verify_origin.then(|| {
            if target_origin.is_wildcard() {
                parent.origin().to_string()
            } else {
                target_origin.to_string()
            }
        });

        let shared = Arc::new(Shared {
            registry: Mutex::new(HandlerRegistry::new()),
            debug: config.debug,
            expected_origin,
        });
        let listener_state = Arc::clone(&shared);
        let subscription =
            window.subscribe(Arc::new(move |event: &MessageEvent| listener_state.handle_event(event)));

        if config.debug {
            debug!(window = %window.origin(), parent = %parent.origin(), %target_origin, "sdk attached");
        }

        Self {
            shared,
            window: window.clone(),
            parent,
            target_origin,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Add a handler for `msg_type`, after any already registered.
    pub fn on(&self, msg_type: &str, handler: Handler) -> &Self {
        lock(&self.shared.registry).push(msg_type, handler);
        self
    }

    /// Add a handler that runs for the next `msg_type` message only.
    pub fn once(&self, msg_type: &str, handler: Handler) -> &Self {
        lock(&self.shared.registry).push_once(msg_type, handler);
        self
    }

    /// Remove one registration of `handler`.
    pub fn off(&self, msg_type: &str, handler: &Handler) -> &Self {
        lock(&self.shared.registry).remove_one(msg_type, handler);
        self
    }

    /// Post `{type, data}` to the parent.
    pub fn send(&self, msg_type: &str, data: Option<Value>) {
        self.post(&Envelope::with_data(msg_type, data));
    }

    /// Post with any serializable payload.
    pub fn send_typed<T: Serialize + ?Sized>(&self, msg_type: &str, data: &T) -> Result<()> {
        self.post(&Envelope::typed(msg_type, Some(data))?);
        Ok(())
    }

    /// Send `request_type` and wait for the first `reply_type` message.
    pub async fn request(
        &self,
        request_type: &str,
        reply_type: &str,
        payload: Option<Value>,
        timeout: Duration,
    ) -> Result<Option<Value>> {
        request(self, request_type, reply_type, payload, timeout).await
    }

    /// Ask the host for the signed-in user.
    pub async fn get_login_info(&self, timeout: Duration) -> Result<LoginInfo> {
        let data = request(self, GET_LOGIN_INFO, LOGIN_INFO_RESPONSE, None, timeout).await?;
        Ok(serde_json::from_value(data.unwrap_or(Value::Null))?)
    }

    /// Ask the host to sign the user out. Returns the host's reply payload.
    pub async fn logout(&self, timeout: Duration) -> Result<Option<Value>> {
        request(self, LOGOUT, LOGOUT_RESPONSE, None, timeout).await
    }

    /// Ask the host to navigate. Nothing is sent for an empty URL.
    pub fn navigate(&self, url: &str, params: Option<Map<String, Value>>) -> Result<()> {
        if url.is_empty() {
            return Err(PeerError::InvalidArgument("URL must not be empty".to_string()));
        }
        let params = NavigateParams {
            url: url.to_string(),
            params,
        };
        self.send_typed(NAVIGATE, &params)
    }

    /// Hand an arbitrary payload to the host.
    pub fn send_data(&self, data: Value) {
        self.send(SEND_DATA, Some(data));
    }

    /// Stop listening and drop every handler. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.unsubscribe();
        }
        lock(&self.shared.registry).clear();
        if self.shared.debug {
            debug!(window = %self.window.origin(), "sdk destroyed");
        }
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

    /// The window this endpoint listens on.
    pub fn window(&self) -> &LocalWindow {
        &self.window
    }

    pub fn parent(&self) -> &Window {
        &self.parent
    }

    pub fn target_origin(&self) -> &TargetOrigin {
        &self.target_origin
    }

    fn post(&self, envelope: &Envelope) {
        let message = envelope.to_value();
        if self.shared.debug {
            debug!(%message, "sdk sending message");
        }
        self.window
            .post_to(&self.parent, message, &self.target_origin);
    }
}

impl Exchange for WatoneSdk {
    type ReplyHandle = Handler;

    fn expect_reply(&self, reply_type: &str, sink: ReplySink) -> Handler {
        lock(&self.shared.registry).push_once(reply_type, Arc::clone(&sink));
        sink
    }

    fn cancel_reply(&self, reply_type: &str, handle: &Handler) {
        lock(&self.shared.registry).remove_one(reply_type, handle);
    }

    fn send_envelope(&self, envelope: Envelope) -> Result<()> {
        self.post(&envelope);
        Ok(())
    }
}

impl fmt::Debug for WatoneSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatoneSdk")
            .field("window", &self.window.origin())
            .field("parent", &self.parent.origin())
            .field("target_origin", &self.target_origin)
            .field("handlers", &*lock(&self.shared.registry))
            .finish()
    }
}
