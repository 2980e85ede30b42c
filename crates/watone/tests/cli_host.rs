#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/watone-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_socket(path: &Path, timeout: Duration) {
    let start = Instant::now();
    while !path.exists() {
        if start.elapsed() >= timeout {
            panic!("host socket did not appear at {}", path.display());
        }
        thread::sleep(Duration::from_millis(25));
    }
}

fn spawn_host(sock_path: &Path, extra: &[&str]) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_watone"))
        .args(["--log-level", "error", "--format", "json", "host"])
        .arg(sock_path)
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("host command should start");
    wait_for_socket(sock_path, Duration::from_secs(3));
    child
}

fn run_child(args: &[&str], sock_path: &Path) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_watone"));
    command.args(["--log-level", "error", "--format", "json"]);
    command.arg(args[0]).arg(sock_path).args(&args[1..]);
    command.output().expect("child command should run")
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn login_info_from_host() {
    let dir = unique_temp_dir("login");
    let sock_path = dir.join("host.sock");
    let host = spawn_host(
        &sock_path,
        &["--user-id", "42", "--username", "alice", "--token", "t0k"],
    );

    let output = run_child(&["login-info"], &sock_path);

    assert!(output.status.success(), "login-info failed: {output:?}");
    let reply: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(
        reply,
        serde_json::json!({ "userId": "42", "username": "alice", "token": "t0k" })
    );

    stop(host);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn logout_reports_success() {
    let dir = unique_temp_dir("logout");
    let sock_path = dir.join("host.sock");
    let host = spawn_host(&sock_path, &[]);

    let output = run_child(&["logout"], &sock_path);

    assert!(output.status.success(), "logout failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"success\":true"));

    stop(host);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn host_prints_received_envelope_and_exits_after_count() {
    let dir = unique_temp_dir("count");
    let sock_path = dir.join("host.sock");
    let host = spawn_host(&sock_path, &["--count", "1"]);

    let output = run_child(&["send-data", "--json", "{\"key\":\"value\"}"], &sock_path);
    assert!(output.status.success(), "send-data failed: {output:?}");

    let host_output = host.wait_with_output().expect("host should exit");
    assert!(host_output.status.success());
    let stdout = String::from_utf8_lossy(&host_output.stdout);
    assert!(stdout.contains("\"type\":\"SEND_DATA\""));
    assert!(stdout.contains("\"data\":{\"key\":\"value\"}"));
    assert!(stdout.contains("\"origin\":\"https://app.local\""));
    assert!(!sock_path.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn navigate_with_empty_url_is_a_usage_error() {
    let dir = unique_temp_dir("navigate");
    let sock_path = dir.join("host.sock");
    let host = spawn_host(&sock_path, &[]);

    let output = run_child(&["navigate", ""], &sock_path);
    assert_eq!(output.status.code(), Some(64));

    let output = run_child(&["navigate", "/dashboard", "--params", "{\"id\":1}"], &sock_path);
    assert!(output.status.success(), "navigate failed: {output:?}");

    stop(host);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_host_is_a_transport_error() {
    let dir = unique_temp_dir("missing");
    let output = run_child(&["login-info"], &dir.join("absent.sock"));
    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_watone"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("watone {}", env!("CARGO_PKG_VERSION")));
}
