use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use watone_transport::{IpcStream, TransportError};

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::wire::WireMessage;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads whole frames from any `Read` stream, buffering partial reads.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            config,
        }
    }

    /// Read the next frame body (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at EOF.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(body) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                return Ok(body);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };
            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read and decode the next wire message (blocking).
    pub fn read_message(&mut self) -> Result<WireMessage> {
        let body = self.read_frame()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Update maximum body size for subsequent reads.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameReader<IpcStream> {
    /// Create a reader over a bridge stream, applying the configured read
    /// timeout to the socket.
    pub fn with_config_ipc(inner: IpcStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }

    /// Change the socket read timeout, e.g. after a bounded handshake.
    pub fn set_read_timeout(&mut self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner
            .set_read_timeout(timeout)
            .map_err(transport_to_frame_error)?;
        self.config.read_timeout = timeout;
        Ok(())
    }
}

pub(crate) fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;
    use serde_json::json;

    use super::*;
    use crate::codec::{encode_frame, MAGIC};
    use crate::writer::FrameWriter;

    #[test]
    fn reads_consecutive_messages() {
        let mut wire = BytesMut::new();
        encode_frame(br#"{"kind":"hello","origin":"https://a"}"#, &mut wire).unwrap();
        encode_frame(
            br#"{"kind":"post","origin":"https://a","data":{"type":"LOGOUT"}}"#,
            &mut wire,
        )
        .unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        assert_eq!(
            reader.read_message().unwrap(),
            WireMessage::Hello {
                origin: "https://a".to_string()
            }
        );
        assert_eq!(
            reader.read_message().unwrap(),
            WireMessage::Post {
                origin: "https://a".to_string(),
                data: json!({ "type": "LOGOUT" }),
            }
        );
        assert!(matches!(
            reader.read_message(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn byte_at_a_time_stream() {
        let mut wire = BytesMut::new();
        encode_frame(br#"{"kind":"hello","origin":"https://slow"}"#, &mut wire).unwrap();

        let mut reader = FrameReader::new(ByteByByte {
            bytes: wire.to_vec(),
            pos: 0,
        });
        assert_eq!(reader.read_message().unwrap().origin(), "https://slow");
    }

    #[test]
    fn closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_slice(&MAGIC);
        partial.put_u32_le(32);
        partial.put_slice(b"{\"kind\"");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn body_that_is_not_a_wire_message() {
        let mut wire = BytesMut::new();
        encode_frame(br#"{"kind":"shout"}"#, &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        assert!(matches!(reader.read_message(), Err(FrameError::Json(_))));
    }

    #[test]
    fn interrupted_read_is_retried() {
        let mut wire = BytesMut::new();
        encode_frame(br#"{"kind":"hello","origin":"https://i"}"#, &mut wire).unwrap();

        let mut reader = FrameReader::new(InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(wire.to_vec()),
        });
        assert_eq!(reader.read_message().unwrap().origin(), "https://i");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = IpcStream::pair().unwrap();
        let mut writer = FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let post = WireMessage::Post {
            origin: "https://app.example".to_string(),
            data: json!({ "type": "SEND_DATA", "data": { "n": 1 } }),
        };
        writer.write_message(&post).unwrap();
        assert_eq!(reader.read_message().unwrap(), post);
    }

    #[test]
    #[cfg(unix)]
    fn read_timeout_surfaces_as_io_error() {
        let (_left, right) = IpcStream::pair().unwrap();
        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(20)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_ipc(right, cfg).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
    }

    struct ByteByByte {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByte {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
