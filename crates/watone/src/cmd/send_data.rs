use serde_json::Value;

use crate::cmd::{open_child, parse_json, SendDataArgs};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: SendDataArgs) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let session = open_child(&args.child)?;
    session.sdk.send_data(payload);
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendDataArgs) -> CliResult<Value> {
    if let Some(json) = &args.json {
        return parse_json("--json", json);
    }
    Ok(args
        .data
        .as_ref()
        .map_or(Value::Null, |data| Value::String(data.clone())))
}
