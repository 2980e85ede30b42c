//! Child SDK and parent listener talking to each other.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use watone_peer::{LoginInfo, ParentConfig, ParentListener, PeerError, SdkConfig, WatoneSdk};
use watone_window::{LocalWindow, Window};

fn serve_login(parent: &Arc<ParentListener>, info: Value) {
    let responder = Arc::downgrade(parent);
    parent.on(
        "GET_LOGIN_INFO",
        Arc::new(move |_: Option<&Value>, _: Option<&Window>| {
            if let Some(parent) = responder.upgrade() {
                let _ = parent.send_to_child("LOGIN_INFO_RESPONSE", Some(info.clone()));
            }
        }),
    );
}

#[tokio::test]
async fn login_info_round_trip_in_process() {
    let host = LocalWindow::new("https://host.example").unwrap();
    let app = LocalWindow::new("https://app.example").unwrap();

    let parent = Arc::new(ParentListener::new(&host, ParentConfig::default()));
    serve_login(
        &parent,
        json!({ "userId": "123", "username": "test", "token": "token123" }),
    );

    let sdk = WatoneSdk::new(&app, host.handle(), SdkConfig::default().with_verify_origin(true));
    let info = sdk.get_login_info(Duration::from_secs(2)).await.unwrap();

    assert_eq!(info, LoginInfo::new("123", "test", "token123"));
    assert_eq!(parent.child(), Some(app.handle()));
}

#[tokio::test]
async fn logout_without_handler_times_out() {
    let host = LocalWindow::new("https://host.example").unwrap();
    let app = LocalWindow::new("https://app.example").unwrap();
    let _parent = ParentListener::new(&host, ParentConfig::default());
    let sdk = WatoneSdk::new(&app, host.handle(), SdkConfig::default());

    let err = sdk.logout(Duration::from_millis(100)).await.unwrap_err();
    assert!(matches!(err, PeerError::Timeout { .. }));
    assert!(sdk.registered_types().is_empty());
}

#[tokio::test]
async fn parent_sees_navigate_and_data() {
    let host = LocalWindow::new("https://host.example").unwrap();
    let app = LocalWindow::new("https://app.example").unwrap();
    let parent = ParentListener::new(&host, ParentConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    for msg_type in ["NAVIGATE", "SEND_DATA"] {
        let seen = Arc::clone(&seen);
        parent.on(
            msg_type,
            Arc::new(move |data: Option<&Value>, _: Option<&Window>| {
                seen.lock().unwrap().push(json!({ msg_type: data.cloned() }));
            }),
        );
    }

    let sdk = WatoneSdk::new(&app, host.handle(), SdkConfig::default());
    sdk.navigate("/orders", None).unwrap();
    sdk.send_data(json!([1, 2, 3]));
    host.flush();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            json!({ "NAVIGATE": { "url": "/orders" } }),
            json!({ "SEND_DATA": [1, 2, 3] }),
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn login_info_round_trip_over_bridge() {
    let dir = std::env::temp_dir().join(format!("watone-peer-bridge-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let sock_path = dir.join("host.sock");

    let host = LocalWindow::new("https://host.example").unwrap();
    let parent = Arc::new(ParentListener::new(&host, ParentConfig::default()));
    serve_login(&parent, json!({ "userId": "7", "username": "remote", "token": "abc" }));

    let server = watone_window::WindowServer::bind(&sock_path, &host).unwrap();
    let accept = thread::spawn(move || {
        let child = server.accept();
        (server, child)
    });

    let app = LocalWindow::new("https://app.example").unwrap();
    let remote_parent = watone_window::connect(&sock_path, &app).unwrap();
    let (_server, child) = accept.join().unwrap();
    let _child = child.unwrap();

    let sdk = WatoneSdk::new(&app, remote_parent, SdkConfig::default().with_verify_origin(true));
    let info = sdk.get_login_info(Duration::from_secs(2)).await.unwrap();

    assert_eq!(info, LoginInfo::new("7", "remote", "abc"));
    let _ = std::fs::remove_dir_all(&dir);
}
