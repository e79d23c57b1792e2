//! Strongly-typed identifier value objects.
//!
//! Every tracked resource is keyed by a database-assigned `i64`. The newtypes
//! keep a `SessionId` from being passed where a `TaskId` is expected while
//! still serializing as a bare integer on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an id from its raw database value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database value.
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

int_id!(
    /// Identifier of a task, the parent resource of every cascade.
    TaskId
);

int_id!(
    /// Identifier of a time-tracking session.
    SessionId
);

int_id!(
    /// Identifier of a recorded span of tracked time.
    SessionRecordId
);

int_id!(
    /// Identifier of a planned calendar slot for a task.
    ScheduleEntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&TaskId::new(10)).unwrap();
        assert_eq!(json, "10");

        let parsed: SessionId = serde_json::from_str("101").unwrap();
        assert_eq!(parsed, SessionId::new(101));
    }

    #[test]
    fn ids_parse_from_path_segments() {
        assert_eq!("301".parse::<ScheduleEntryId>().unwrap().value(), 301);
        assert!("abc".parse::<SessionRecordId>().is_err());
    }

    #[test]
    fn ids_convert_to_raw_values() {
        let raw: i64 = SessionRecordId::new(201).into();
        assert_eq!(raw, 201);
        assert_eq!(TaskId::from(7).to_string(), "7");
    }
}
