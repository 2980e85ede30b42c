use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest origin string accepted from a bridge peer.
pub const MAX_ORIGIN_LEN: usize = 2048;

/// Body of one bridge frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireMessage {
    /// Sent once in each direction when a bridge connects, announcing the
    /// origin of the window on that end.
    Hello { origin: String },
    /// A message posted by the window on the sending end.
    Post { origin: String, data: Value },
}

impl WireMessage {
    /// Origin carried by either variant.
    pub fn origin(&self) -> &str {
        match self {
            Self::Hello { origin } | Self::Post { origin, .. } => origin,
        }
    }
}

/// Checks that an origin announced by a peer is usable.
pub fn validate_origin(origin: &str) -> std::result::Result<(), String> {
    if origin.is_empty() {
        return Err("origin must not be empty".to_string());
    }
    if origin.len() > MAX_ORIGIN_LEN {
        return Err(format!(
            "origin too long ({} bytes, max {MAX_ORIGIN_LEN})",
            origin.len()
        ));
    }
    if origin.chars().any(char::is_control) {
        return Err("origin contains control characters".to_string());
    }
    if origin == "*" {
        return Err("'*' is a target policy, not an origin".to_string());
    }
    Ok(())
}
