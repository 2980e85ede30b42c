//! Correlated request/response on top of fire-and-forget envelopes.
//!
//! The wire carries no request id: a request is answered by the first
//! message of the expected reply type that arrives after it was sent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use watone_frame::Envelope;

use crate::error::{PeerError, Result};
use crate::lock;

/// Timeout used by the convenience request methods when none is given.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Receives the payload of a reply.
pub type ReplySink = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// What an endpoint must offer for [`request`] to run over it.
pub trait Exchange {
    /// Token identifying one registered reply handler.
    type ReplyHandle: Send;

    /// Register `sink` as a one-shot handler for `reply_type`.
    fn expect_reply(&self, reply_type: &str, sink: ReplySink) -> Self::ReplyHandle;

    /// Deregister a reply handler. Must be a no-op if it already fired.
    fn cancel_reply(&self, reply_type: &str, handle: &Self::ReplyHandle);

    /// Post an envelope to the counterpart.
    fn send_envelope(&self, envelope: Envelope) -> Result<()>;
}

/// Removes the reply handler whichever way the request ends, including
/// when the request future is dropped.
struct PendingReply<'a, E: Exchange + ?Sized> {
    endpoint: &'a E,
    reply_type: &'a str,
    handle: E::ReplyHandle,
}

impl<E: Exchange + ?Sized> Drop for PendingReply<'_, E> {
    fn drop(&mut self) {
        self.endpoint.cancel_reply(self.reply_type, &self.handle);
    }
}

/// Send `request_type` and wait for the first `reply_type` message.
///
/// Resolves with the reply's payload, or fails with
/// [`PeerError::Timeout`] once `timeout` elapses. The reply handler is
/// gone from the endpoint by the time this returns. If the endpoint is
/// torn down mid-request the request still ends through its timeout.
pub async fn request<E: Exchange + ?Sized>(
    endpoint: &E,
    request_type: &str,
    reply_type: &str,
    payload: Option<Value>,
    timeout: Duration,
) -> Result<Option<Value>> {
    let (tx, rx) = oneshot::channel();
    let slot = Mutex::new(Some(tx));
    let sink: ReplySink = Arc::new(move |data: Option<&Value>| {
        if let Some(tx) = lock(&slot).take() {
            let _ = tx.send(data.cloned());
        }
    });

    let _pending = PendingReply {
        endpoint,
        reply_type,
        handle: endpoint.expect_reply(reply_type, sink),
    };
    endpoint.send_envelope(Envelope::with_data(request_type, payload))?;

    let reply = async {
        match rx.await {
            Ok(data) => data,
            // Sender dropped with the endpoint's registry: wait out the timer.
            Err(_) => std::future::pending().await,
        }
    };

    tokio::time::timeout(timeout, reply)
        .await
        .map_err(|_| PeerError::Timeout {
            reply_type: reply_type.to_string(),
            timeout,
        })
}
