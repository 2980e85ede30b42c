use serde_json::Value;

use crate::cmd::{open_child, parse_json, NavigateArgs};
use crate::exit::{peer_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: NavigateArgs) -> CliResult<i32> {
    let params = match &args.params {
        Some(raw) => match parse_json("--params", raw)? {
            Value::Object(map) => Some(map),
            _ => return Err(CliError::new(USAGE, "--params must be a JSON object")),
        },
        None => None,
    };

    let session = open_child(&args.child)?;
    session
        .sdk
        .navigate(&args.url, params)
        .map_err(|err| peer_error("navigate failed", err))?;
    Ok(SUCCESS)
}
