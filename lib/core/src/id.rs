//! Identifiers.
//!
//! Anything the engine creates (executions, scene objects, subscriptions) gets
//! a ULID, so IDs sort by creation time. They display with a short type
//! prefix (`exec_01J...`) and parse with or without it.
//!
//! Rule IDs are authored by people and stay plain strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A string that is not a valid ID of the requested kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// Display prefix of the ID kind that was expected.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {} id", self.input, self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Prefix shown before the ULID.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a fresh ID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Milliseconds since the Unix epoch at which the ID was generated.
            #[must_use]
            pub fn timestamp_ms(&self) -> u64 {
                self.0.timestamp_ms()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .unwrap_or(s);
                raw.parse::<Ulid>().map(Self).map_err(|_| ParseIdError {
                    kind: Self::PREFIX,
                    input: s.to_string(),
                })
            }
        }
    };
}

ulid_id!(
    /// One firing of a workflow rule.
    ExecutionId => "exec"
);

ulid_id!(
    /// An object on the editing surface.
    ObjectId => "obj"
);

ulid_id!(
    /// Handle returned by an event bus subscription, used to unsubscribe.
    SubscriptionId => "sub"
);

/// Identifier of a workflow rule.
///
/// Rule IDs are chosen by whoever authors the rule (`auto-format-risk-matrix`)
/// and must stay stable across sessions, so they are not generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a rule ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
