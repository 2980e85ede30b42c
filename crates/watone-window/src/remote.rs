use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};
use watone_frame::{FrameError, FrameWriter, WireMessage};
use watone_transport::IpcStream;

use crate::window::lock;

/// Write side of a bridge: the local stand-in for a window in another
/// process.
pub(crate) struct RemoteWindow {
    origin: String,
    writer: Mutex<FrameWriter<IpcStream>>,
    control: IpcStream,
    closed: AtomicBool,
}

impl RemoteWindow {
    pub(crate) fn new(origin: String, writer: FrameWriter<IpcStream>, control: IpcStream) -> Self {
        Self {
            origin,
            writer: Mutex::new(writer),
            control,
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn post(&self, source_origin: &str, data: Value) {
        if self.is_closed() {
            debug!(origin = %self.origin, "bridge closed; dropping message");
            return;
        }

        let message = WireMessage::Post {
            origin: source_origin.to_string(),
            data,
        };
        match lock(&self.writer).write_message(&message) {
            Ok(()) => {}
            // Rejected before any byte hit the socket; the stream is still in sync.
            Err(err @ (FrameError::PayloadTooLarge { .. } | FrameError::Json(_))) => {
                warn!(origin = %self.origin, error = %err, "bridge message rejected; dropped");
            }
            Err(err) => {
                warn!(origin = %self.origin, error = %err, "bridge write failed; closing");
                self.mark_closed();
            }
        }
    }

    pub(crate) fn close(&self) {
        self.mark_closed();
        if let Err(err) = self.control.shutdown() {
            debug!(origin = %self.origin, error = %err, "bridge shutdown failed");
        }
    }
}
