use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use watone_frame::{is_known, reply_type_for, Envelope, GET_LOGIN_INFO, LOGOUT};
use watone_peer::{LoginInfo, ParentConfig, ParentListener};
use watone_window::{LocalWindow, MessageEvent, Window, WindowServer};

use crate::cmd::{parse_json, HostArgs};
use crate::exit::{io_error, window_error, CliError, CliResult, DATA_INVALID, INTERNAL, SUCCESS};
use crate::output::{print_received, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Received {
    origin: String,
    data: Value,
}

pub fn run(args: HostArgs, format: OutputFormat) -> CliResult<i32> {
    let login = resolve_login(&args)?;

    let window =
        LocalWindow::new(args.origin.as_str()).map_err(|err| window_error("invalid origin", err))?;
    let parent = Arc::new(ParentListener::new(
        &window,
        ParentConfig::default().with_debug(args.debug),
    ));
    install_replies(&parent, login);

    // Registered after the parent listener, so replies are already on their
    // way when a message is printed.
    let (tx, inbox) = mpsc::channel();
    let tx = Mutex::new(tx);
    let _tap = window.subscribe(Arc::new(move |event: &MessageEvent| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(Received {
                origin: event.origin.clone(),
                data: event.data.clone(),
            });
        }
    }));

    let server =
        WindowServer::bind(&args.path, &window).map_err(|err| window_error("bind failed", err))?;
    info!(path = %server.path().display(), origin = %window.origin(), "host window ready");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let socket_path = server.path().to_path_buf();
    thread::Builder::new()
        .name("watone-accept".to_string())
        .spawn(move || accept_loop(&server))
        .map_err(|err| io_error("accept thread failed", err))?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let received = match inbox.recv_timeout(POLL_INTERVAL) {
            Ok(received) => received,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if let Some(envelope) = Envelope::from_value(&received.data) {
            if !is_known(&envelope.msg_type) {
                debug!(msg_type = %envelope.msg_type, "custom message type received");
            }
        }
        print_received(&received.data, &received.origin, format);
        printed = printed.saturating_add(1);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    parent.destroy();
    // The accept thread still owns the server, so its drop never runs.
    let _ = std::fs::remove_file(&socket_path);
    Ok(SUCCESS)
}

fn accept_loop(server: &WindowServer) {
    loop {
        match server.accept() {
            Ok(child) => info!(origin = %child.origin(), "child window connected"),
            Err(err) => warn!(error = %err, "child connection rejected"),
        }
    }
}

fn resolve_login(args: &HostArgs) -> CliResult<Value> {
    let info = match &args.login_json {
        Some(raw) => serde_json::from_value::<LoginInfo>(parse_json("--login-json", raw)?)
            .map_err(|err| {
                CliError::new(DATA_INVALID, format!("--login-json is not login info: {err}"))
            })?,
        None => LoginInfo::new(
            args.user_id.as_str(),
            args.username.as_str(),
            args.token.as_str(),
        ),
    };
    serde_json::to_value(&info)
        .map_err(|err| CliError::new(INTERNAL, format!("login info encoding failed: {err}")))
}

fn install_replies(parent: &Arc<ParentListener>, login: Value) {
    answer(parent, GET_LOGIN_INFO, login);
    answer(parent, LOGOUT, json!({ "success": true }));
}

/// Answer every `request_type` message with `reply` under its paired type.
fn answer(parent: &Arc<ParentListener>, request_type: &str, reply: Value) {
    let Some(reply_type) = reply_type_for(request_type) else {
        return;
    };
    let responder = Arc::downgrade(parent);
    parent.on(
        request_type,
        Arc::new(move |_: Option<&Value>, _: Option<&Window>| {
            if let Some(parent) = responder.upgrade() {
                if let Err(err) = parent.send_to_child(reply_type, Some(reply.clone())) {
                    warn!(error = %err, %reply_type, "reply to child failed");
                }
            }
        }),
    );
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
