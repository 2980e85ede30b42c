use serde_json::Value;

use crate::cmd::{block_on, open_child, parse_duration, RequestArgs};
use crate::exit::{peer_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let session = open_child(&args.child)?;

    let reply = block_on(session.sdk.logout(timeout))?
        .map_err(|err| peer_error("logout request failed", err))?;

    print_value(&reply.unwrap_or(Value::Null), format);
    Ok(SUCCESS)
}
