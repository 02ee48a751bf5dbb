//! Strongly typed identifiers for missions, tasks, and agents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Hex form without hyphens, used wherever the id ends up in a ref or path.
            pub fn simple(&self) -> String {
                self.0.simple().to_string()
            }

            /// First eight hex characters, for display only.
            pub fn short(&self) -> String {
                self.simple()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a mission.
    MissionId
);
uuid_id!(
    /// Identifier of a task within a mission.
    TaskId
);
uuid_id!(
    /// Identifier of the agent executing a task.
    AgentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_display() {
        let id = MissionId::new();
        let parsed: MissionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_simple_form_has_no_hyphens() {
        let id = TaskId::new();
        assert_eq!(id.simple().len(), 32);
        assert!(!id.simple().contains('-'));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_garbage_does_not_parse() {
        assert!("not-an-id".parse::<AgentId>().is_err());
    }
}
