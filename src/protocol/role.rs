use serde::{Deserialize, Serialize};
use std::fmt;

/// Worker-to-coordinator model/gradient update
pub const PUSH: i32 = 1;

/// Coordinator-to-worker model retrieval
pub const PULL: i32 = 2;

/// Logical role of a message carried over the shared wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Push,
    Pull,
}

impl Role {
    /// Get the integer tag for the wire protocol
    pub fn tag(self) -> i32 {
        match self {
            Role::Push => PUSH,
            Role::Pull => PULL,
        }
    }

    /// Detect role from its integer tag
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            PUSH => Some(Role::Push),
            PULL => Some(Role::Pull),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Role::Push => "PUSH",
            Role::Pull => "PULL",
        }
    }
}

impl TryFrom<i32> for Role {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        Self::from_tag(tag).ok_or(tag)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
