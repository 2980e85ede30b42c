//! An embedded app and its host in one process.
//!
//! Run with:
//!   cargo run --example embedded-pair
//!
//! The host answers GET_LOGIN_INFO; the app fetches it, then navigates.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use watone::peer::{ParentConfig, ParentListener, SdkConfig, WatoneSdk, DEFAULT_REQUEST_TIMEOUT};
use watone::window::{LocalWindow, Window};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = LocalWindow::new("https://host.example")?;
    let app = LocalWindow::new("https://app.example")?;

    let parent = Arc::new(ParentListener::new(&host, ParentConfig::default()));
    let responder = Arc::downgrade(&parent);
    parent
        .on(
            "GET_LOGIN_INFO",
            Arc::new(move |_: Option<&Value>, _: Option<&Window>| {
                if let Some(parent) = responder.upgrade() {
                    let _ = parent.send_to_child(
                        "LOGIN_INFO_RESPONSE",
                        Some(json!({ "userId": "1", "username": "demo", "token": "secret" })),
                    );
                }
            }),
        )
        .on(
            "NAVIGATE",
            Arc::new(|data: Option<&Value>, source: Option<&Window>| {
                let from = source.map_or("unknown", |window| window.origin());
                eprintln!("host: navigate from {from}: {}", data.cloned().unwrap_or(Value::Null));
            }),
        );

    let sdk = WatoneSdk::new(&app, host.handle(), SdkConfig::default());
    let info = sdk.get_login_info(DEFAULT_REQUEST_TIMEOUT).await?;
    eprintln!("app: signed in as {} ({})", info.username, info.user_id);

    sdk.navigate("/dashboard", None)?;
    host.flush();

    match sdk.logout(Duration::from_millis(200)).await {
        Ok(reply) => eprintln!("app: logout reply {reply:?}"),
        Err(err) => eprintln!("app: {err}"),
    }

    sdk.destroy();
    parent.destroy();
    Ok(())
}
