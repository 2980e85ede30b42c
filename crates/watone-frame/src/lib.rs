//! Message envelopes and wire framing.
//!
//! Every message exchanged between two windows is an [`Envelope`]: a
//! `{"type": ..., "data": ...}` JSON object whose `type` picks the handlers
//! on the receiving side. Between processes, posts travel inside a
//! [`WireMessage`] framed as:
//! - A 2-byte magic number ("WT")
//! - A 4-byte little-endian body length
//! - The JSON body

pub mod codec;
pub mod envelope;
pub mod error;
pub mod message_type;
pub mod reader;
pub mod wire;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use envelope::Envelope;
pub use error::{FrameError, Result};
pub use message_type::{
    is_known, reply_type_for, GET_LOGIN_INFO, LOGIN_INFO_RESPONSE, LOGOUT, LOGOUT_RESPONSE, NAVIGATE,
    SEND_DATA,
};
pub use reader::FrameReader;
pub use wire::{validate_origin, WireMessage, MAX_ORIGIN_LEN};
pub use writer::FrameWriter;
