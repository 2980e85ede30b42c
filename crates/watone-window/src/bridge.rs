//! Cross-process window bridge.
//!
//! A bridge joins a [`LocalWindow`] in this process to a window in another
//! process over a Unix domain socket. Each side first announces its origin
//! with a hello frame; afterwards every post to the returned [`Window`] is
//! written to the socket, and every post read from the socket is queued on
//! the local window with that same `Window` as its source, so replies go
//! straight back over the bridge.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};
use watone_frame::{
    validate_origin, FrameConfig, FrameError, FrameReader, FrameWriter, WireMessage,
    DEFAULT_MAX_PAYLOAD,
};
use watone_transport::{IpcStream, UnixDomainSocket};

use crate::error::{Result, WindowError};
use crate::event::MessageEvent;
use crate::remote::RemoteWindow;
use crate::window::{LocalWindow, Window};

/// Limits applied to a bridge connection.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long to wait for the peer's hello.
    pub handshake_timeout: Duration,
    /// Largest hello frame accepted before the peer has identified itself.
    pub max_handshake_payload: usize,
    /// Largest post frame accepted afterwards.
    pub max_payload_size: usize,
    /// Socket write timeout, so a stalled peer cannot block posting forever.
    pub write_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            max_handshake_payload: 16 * 1024,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            write_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Accepts bridge connections into a local window.
pub struct WindowServer {
    socket: UnixDomainSocket,
    local: LocalWindow,
    config: BridgeConfig,
}

impl WindowServer {
    /// Bind a socket at `path` serving `local`.
    pub fn bind(path: impl AsRef<Path>, local: &LocalWindow) -> Result<Self> {
        Ok(Self {
            socket: UnixDomainSocket::bind(path)?,
            local: local.clone(),
            config: BridgeConfig::default(),
        })
    }

    /// Override bridge limits.
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept the next connection and return the window on the other end.
    pub fn accept(&self) -> Result<Window> {
        let stream = self.socket.accept()?;
        bridge_stream(stream, &self.local, &self.config)
    }

    /// Bound socket path.
    pub fn path(&self) -> &Path {
        self.socket.path()
    }

    /// The window connections are bridged into.
    pub fn local(&self) -> &LocalWindow {
        &self.local
    }
}

/// Connect `local` to the window served at `path`.
pub fn connect(path: impl AsRef<Path>, local: &LocalWindow) -> Result<Window> {
    connect_with_config(path, local, &BridgeConfig::default())
}

/// Connect with explicit limits.
pub fn connect_with_config(
    path: impl AsRef<Path>,
    local: &LocalWindow,
    config: &BridgeConfig,
) -> Result<Window> {
    let stream = UnixDomainSocket::connect(path)?;
    bridge_stream(stream, local, config)
}

/// Run the hello exchange on an already connected stream and start
/// forwarding inbound posts into `local`.
pub fn bridge_stream(stream: IpcStream, local: &LocalWindow, config: &BridgeConfig) -> Result<Window> {
    let reader_stream = stream.try_clone()?;
    let control = stream.try_clone()?;

    let frame_config = FrameConfig {
        max_payload_size: config.max_handshake_payload,
        read_timeout: Some(config.handshake_timeout),
        write_timeout: config.write_timeout,
    };
    let mut reader = FrameReader::with_config_ipc(reader_stream, frame_config.clone())?;
    let mut writer = FrameWriter::with_config_ipc(stream, frame_config)?;

    writer.write_message(&WireMessage::Hello {
        origin: local.origin().to_string(),
    })?;

    let remote_origin = match reader.read_message() {
        Ok(WireMessage::Hello { origin }) => origin,
        Ok(WireMessage::Post { .. }) => {
            return Err(WindowError::Handshake(
                "expected hello, got post".to_string(),
            ))
        }
        Err(FrameError::Io(err))
            if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            return Err(WindowError::Timeout(config.handshake_timeout));
        }
        Err(FrameError::ConnectionClosed) => {
            return Err(WindowError::Handshake(
                "peer closed before saying hello".to_string(),
            ))
        }
        Err(err) => return Err(err.into()),
    };
    validate_origin(&remote_origin).map_err(WindowError::Handshake)?;

    // The hello budget only applies before the peer has identified itself.
    reader.set_max_payload_size(config.max_payload_size);
    writer.set_max_payload_size(config.max_payload_size);
    reader.set_read_timeout(None)?;

    let proxy = Window::from_remote(Arc::new(RemoteWindow::new(
        remote_origin.clone(),
        writer,
        control,
    )));

    info!(local = %local.origin(), remote = %remote_origin, "window bridge established");

    let pump_local = local.clone();
    let pump_proxy = proxy.clone();
    thread::Builder::new()
        .name(format!("watone-bridge {remote_origin}"))
        .spawn(move || pump(reader, &pump_local, &pump_proxy))
        .map_err(WindowError::Spawn)?;

    Ok(proxy)
}

fn pump(mut reader: FrameReader<IpcStream>, local: &LocalWindow, proxy: &Window) {
    loop {
        match reader.read_message() {
            Ok(WireMessage::Post { origin, data }) => {
                if origin != proxy.origin() {
                    warn!(
                        claimed = %origin,
                        announced = %proxy.origin(),
                        "bridge post claims another origin; dropped"
                    );
                    continue;
                }
                local.dispatch_event(MessageEvent {
                    data,
                    origin,
                    source: Some(proxy.clone()),
                });
            }
            Ok(WireMessage::Hello { .. }) => {
                warn!(remote = %proxy.origin(), "repeated hello on bridge; ignored");
            }
            Err(FrameError::Json(err)) => {
                warn!(remote = %proxy.origin(), error = %err, "malformed bridge frame; dropped");
            }
            Err(FrameError::ConnectionClosed) => {
                debug!(remote = %proxy.origin(), "bridge closed by peer");
                break;
            }
            Err(err) => {
                warn!(remote = %proxy.origin(), error = %err, "bridge read failed");
                break;
            }
        }
    }
    proxy.close();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{mpsc, Mutex};
    use std::time::Instant;

    use serde_json::json;

    use super::*;
    use crate::origin::TargetOrigin;

    fn make_sock_path(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "watone-bridge-{}-{}-{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("host.sock")
    }

    fn recorder(window: &LocalWindow) -> mpsc::Receiver<MessageEvent> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        window.add_listener(Arc::new(move |event: &MessageEvent| {
            let _ = tx.lock().unwrap().send(event.clone());
        }));
        rx
    }

    fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        check()
    }

    #[test]
    fn posts_cross_the_bridge_both_ways() {
        let sock_path = make_sock_path("roundtrip");
        let host = LocalWindow::new("https://host.example").unwrap();
        let app = LocalWindow::new("https://app.example").unwrap();
        let host_events = recorder(&host);
        let app_events = recorder(&app);

        let server = WindowServer::bind(&sock_path, &host).unwrap();
        let accept = thread::spawn(move || server.accept().map(|child| (server, child)));

        let parent = connect(&sock_path, &app).expect("child should connect");
        let (_server, child) = accept.join().unwrap().expect("host should accept");

        assert_eq!(parent.origin(), "https://host.example");
        assert_eq!(child.origin(), "https://app.example");
        assert!(parent.is_remote());

        app.post_to(&parent, json!({ "type": "GET_LOGIN_INFO" }), &TargetOrigin::Any);
        let event = host_events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.data, json!({ "type": "GET_LOGIN_INFO" }));
        assert_eq!(event.origin, "https://app.example");

        let reply_to = event.source.expect("bridged events carry a source");
        assert_eq!(reply_to, child);
        host.post_to(&reply_to, json!({ "type": "LOGIN_INFO_RESPONSE" }), &TargetOrigin::Any);

        let reply = app_events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(reply.data, json!({ "type": "LOGIN_INFO_RESPONSE" }));
        assert_eq!(reply.origin, "https://host.example");

        if let Some(dir) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn target_origin_is_checked_against_remote_origin() {
        let (left, right) = IpcStream::pair().unwrap();
        let host = LocalWindow::new("https://host.example").unwrap();
        let app = LocalWindow::new("https://app.example").unwrap();
        let host_events = recorder(&host);

        let host_side = thread::spawn({
            let host = host.clone();
            move || bridge_stream(left, &host, &BridgeConfig::default())
        });
        let parent = bridge_stream(right, &app, &BridgeConfig::default()).unwrap();
        let _child = host_side.join().unwrap().unwrap();

        app.post_to(&parent, json!("blocked"), &TargetOrigin::exact("https://other.example"));
        app.post_to(&parent, json!("allowed"), &TargetOrigin::exact("https://host.example"));

        let event = host_events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.data, json!("allowed"));
        host.flush();
        assert!(host_events.try_recv().is_err());
    }

    #[test]
    fn close_is_seen_by_the_other_side() {
        let (left, right) = IpcStream::pair().unwrap();
        let host = LocalWindow::new("https://host.example").unwrap();
        let app = LocalWindow::new("https://app.example").unwrap();

        let host_side = thread::spawn({
            let host = host.clone();
            move || bridge_stream(left, &host, &BridgeConfig::default())
        });
        let parent = bridge_stream(right, &app, &BridgeConfig::default()).unwrap();
        let child = host_side.join().unwrap().unwrap();

        parent.close();
        assert!(parent.is_closed());
        assert!(wait_until(Duration::from_secs(2), || child.is_closed()));

        // Posting to a closed bridge is silently dropped.
        host.post_to(&child, json!("late"), &TargetOrigin::Any);
    }

    #[test]
    fn handshake_times_out_on_silent_peer() {
        let (_left, right) = IpcStream::pair().unwrap();
        let app = LocalWindow::new("https://app.example").unwrap();
        let config = BridgeConfig {
            handshake_timeout: Duration::from_millis(30),
            ..BridgeConfig::default()
        };

        let result = bridge_stream(right, &app, &config);
        assert!(matches!(result, Err(WindowError::Timeout(_))));
    }

    #[test]
    fn handshake_rejects_post_before_hello() {
        let (left, right) = IpcStream::pair().unwrap();
        let mut raw = FrameWriter::new(left);
        raw.write_message(&WireMessage::Post {
            origin: "https://host.example".to_string(),
            data: json!(null),
        })
        .unwrap();

        let app = LocalWindow::new("https://app.example").unwrap();
        let result = bridge_stream(right, &app, &BridgeConfig::default());
        assert!(matches!(result, Err(WindowError::Handshake(_))));
    }

    #[test]
    fn handshake_rejects_wildcard_origin() {
        let (left, right) = IpcStream::pair().unwrap();
        let mut raw = FrameWriter::new(left);
        raw.write_message(&WireMessage::Hello {
            origin: "*".to_string(),
        })
        .unwrap();

        let app = LocalWindow::new("https://app.example").unwrap();
        let result = bridge_stream(right, &app, &BridgeConfig::default());
        assert!(matches!(result, Err(WindowError::Handshake(_))));
    }

    #[test]
    fn spoofed_post_origin_is_dropped() {
        let (left, right) = IpcStream::pair().unwrap();
        let host = LocalWindow::new("https://host.example").unwrap();
        let host_events = recorder(&host);

        let mut raw_writer = FrameWriter::new(left.try_clone().unwrap());
        raw_writer
            .write_message(&WireMessage::Hello {
                origin: "https://app.example".to_string(),
            })
            .unwrap();
        let _child = bridge_stream(right, &host, &BridgeConfig::default()).unwrap();

        raw_writer
            .write_message(&WireMessage::Post {
                origin: "https://bank.example".to_string(),
                data: json!("spoofed"),
            })
            .unwrap();
        raw_writer
            .write_message(&WireMessage::Post {
                origin: "https://app.example".to_string(),
                data: json!("genuine"),
            })
            .unwrap();

        let event = host_events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.data, json!("genuine"));
        drop(left);
    }

    #[test]
    fn oversized_post_is_dropped_without_closing() {
        let (left, right) = IpcStream::pair().unwrap();
        let host = LocalWindow::new("https://host.example").unwrap();
        let app = LocalWindow::new("https://app.example").unwrap();
        let host_events = recorder(&host);

        let host_side = thread::spawn({
            let host = host.clone();
            move || bridge_stream(left, &host, &BridgeConfig::default())
        });
        let small_frames = BridgeConfig {
            max_payload_size: 64,
            ..BridgeConfig::default()
        };
        let parent = bridge_stream(right, &app, &small_frames).unwrap();
        let _child = host_side.join().unwrap().unwrap();

        app.post_to(&parent, json!("x".repeat(200)), &TargetOrigin::Any);
        assert!(!parent.is_closed());

        app.post_to(&parent, json!("small"), &TargetOrigin::Any);
        let event = host_events.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.data, json!("small"));
        assert!(!parent.is_closed());
    }
}
