use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use watone_peer::{SdkConfig, WatoneSdk};
use watone_window::{connect_with_config, BridgeConfig, LocalWindow, Window};

use crate::exit::{io_error, window_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod host;
pub mod login_info;
pub mod logout;
pub mod navigate;
pub mod send_data;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a parent window and answer child requests.
    Host(HostArgs),
    /// Ask a host for login info.
    LoginInfo(RequestArgs),
    /// Ask a host to sign the user out.
    Logout(RequestArgs),
    /// Ask a host to navigate.
    Navigate(NavigateArgs),
    /// Hand a payload to a host.
    SendData(SendDataArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Host(args) => host::run(args, format),
        Command::LoginInfo(args) => login_info::run(args, format),
        Command::Logout(args) => logout::run(args, format),
        Command::Navigate(args) => navigate::run(args),
        Command::SendData(args) => send_data::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Origin of the host window.
    #[arg(long, env = "WATONE_HOST_ORIGIN", default_value = "https://host.local")]
    pub origin: String,
    /// userId returned for GET_LOGIN_INFO.
    #[arg(long, default_value = "demo-user")]
    pub user_id: String,
    /// username returned for GET_LOGIN_INFO.
    #[arg(long, default_value = "demo")]
    pub username: String,
    /// token returned for GET_LOGIN_INFO.
    #[arg(long, env = "WATONE_TOKEN", default_value = "demo-token")]
    pub token: String,
    /// Full login info object, replacing the individual fields.
    #[arg(long, value_name = "JSON", conflicts_with_all = ["user_id", "username", "token"])]
    pub login_json: Option<String>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Log every envelope at debug level.
    #[arg(long)]
    pub debug: bool,
}

/// Connection options shared by the child commands.
#[derive(Args, Debug)]
pub struct ChildArgs {
    /// Socket path of the host.
    pub path: PathBuf,
    /// Origin of the child window.
    #[arg(long, env = "WATONE_ORIGIN", default_value = "https://app.local")]
    pub origin: String,
    /// Target origin for posts to the host ("*" disables the check).
    #[arg(long, value_name = "ORIGIN")]
    pub parent_origin: Option<String>,
    /// Time allowed for the bridge handshake (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
    /// Log every envelope at debug level.
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    #[command(flatten)]
    pub child: ChildArgs,
    /// Time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct NavigateArgs {
    #[command(flatten)]
    pub child: ChildArgs,
    /// Destination URL.
    pub url: String,
    /// Extra navigation parameters as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendDataArgs {
    #[command(flatten)]
    pub child: ChildArgs,
    /// JSON payload.
    #[arg(long, conflicts_with = "data")]
    pub json: Option<String>,
    /// String payload.
    #[arg(long, conflicts_with = "json")]
    pub data: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// A child window bridged to a running host.
pub struct ChildSession {
    pub sdk: WatoneSdk,
    parent: Window,
}

impl Drop for ChildSession {
    fn drop(&mut self) {
        self.sdk.destroy();
        self.parent.close();
    }
}

pub fn open_child(args: &ChildArgs) -> CliResult<ChildSession> {
    let config = BridgeConfig {
        handshake_timeout: parse_duration(&args.connect_timeout)?,
        ..BridgeConfig::default()
    };
    let window =
        LocalWindow::new(args.origin.as_str()).map_err(|err| window_error("invalid origin", err))?;
    let parent = connect_with_config(&args.path, &window, &config)
        .map_err(|err| window_error("connect failed", err))?;

    let mut sdk_config = SdkConfig::default()
        .with_debug(args.debug)
        .with_verify_origin(true);
    if let Some(origin) = &args.parent_origin {
        sdk_config = sdk_config.with_parent_origin(origin.as_str().into());
    }

    Ok(ChildSession {
        sdk: WatoneSdk::new(&window, parent.clone(), sdk_config),
        parent,
    })
}

/// Drive one async SDK call to completion.
pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;
    Ok(runtime.block_on(future))
}

pub fn parse_json(flag: &str, input: &str) -> CliResult<serde_json::Value> {
    serde_json::from_str(input)
        .map_err(|err| CliError::new(USAGE, format!("{flag} is not valid JSON: {err}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration(" 3 ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
        assert_eq!(parse_duration("5m").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_json_reports_flag() {
        let err = parse_json("--params", "{oops").unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("--params is not valid JSON"));
    }
}
