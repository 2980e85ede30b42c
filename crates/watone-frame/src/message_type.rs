//! Message types understood by the SDK.
//!
//! `type` is an open discriminator: these are the values the child SDK and
//! the parent listener agree on, but any other string may be registered and
//! sent.

/// Child asks the parent for the current login.
pub const GET_LOGIN_INFO: &str = "GET_LOGIN_INFO";

/// Parent answers [`GET_LOGIN_INFO`] with `{userId, username, token, ...}`.
pub const LOGIN_INFO_RESPONSE: &str = "LOGIN_INFO_RESPONSE";

/// Child asks the parent to navigate to `{url, params?}`. No reply.
pub const NAVIGATE: &str = "NAVIGATE";

/// Child pushes an arbitrary payload to the parent. No reply.
pub const SEND_DATA: &str = "SEND_DATA";

/// Child asks the parent to end the session.
pub const LOGOUT: &str = "LOGOUT";

/// Parent answers [`LOGOUT`] with an arbitrary payload.
pub const LOGOUT_RESPONSE: &str = "LOGOUT_RESPONSE";

/// Returns the reply type paired with a request type, if it has one.
pub fn reply_type_for(request_type: &str) -> Option<&'static str> {
    match request_type {
        GET_LOGIN_INFO => Some(LOGIN_INFO_RESPONSE),
        LOGOUT => Some(LOGOUT_RESPONSE),
        _ => None,
    }
}

/// Returns true for the types listed in this module.
pub fn is_known(msg_type: &str) -> bool {
    matches!(
        msg_type,
        GET_LOGIN_INFO | LOGIN_INFO_RESPONSE | NAVIGATE | SEND_DATA | LOGOUT | LOGOUT_RESPONSE
    )
}
