use watone_peer::LoginInfo;

use crate::cmd::{block_on, open_child, parse_duration, RequestArgs};
use crate::exit::{peer_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: RequestArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let session = open_child(&args.child)?;

    let info: LoginInfo = block_on(session.sdk.get_login_info(timeout))?
        .map_err(|err| peer_error("login info request failed", err))?;

    let value = serde_json::to_value(&info)
        .map_err(|err| CliError::new(INTERNAL, format!("login info encoding failed: {err}")))?;
    print_value(&value, format);
    Ok(SUCCESS)
}
