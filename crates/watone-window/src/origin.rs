use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Which origins a posted message may be delivered to.
///
/// `Any` (`*`) switches the check off entirely: the message is delivered
/// to the target whatever document it currently holds. It is what the
/// parent side always uses, and what a child may opt into when the
/// embedding origin is not known ahead of time. It is also how a message
/// leaks to an unexpected embedder, so prefer `Exact` when the origin is
/// known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetOrigin {
    /// Deliver regardless of the target's origin.
    Any,
    /// Deliver only if the target's origin equals this string.
    Exact(String),
}

impl TargetOrigin {
    /// Wire spelling of [`TargetOrigin::Any`].
    pub const WILDCARD: &'static str = "*";

    /// Policy matching exactly `origin`.
    pub fn exact(origin: impl Into<String>) -> Self {
        Self::Exact(origin.into())
    }

    /// `*` becomes [`TargetOrigin::Any`], anything else an exact match.
    pub fn parse(value: &str) -> Self {
        if value == Self::WILDCARD {
            Self::Any
        } else {
            Self::Exact(value.to_string())
        }
    }

    /// Whether a window with `origin` passes this policy.
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == origin,
        }
    }

    /// True for `*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(Self::WILDCARD),
            Self::Exact(origin) => f.write_str(origin),
        }
    }
}

impl FromStr for TargetOrigin {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(value))
    }
}

impl From<&str> for TargetOrigin {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
