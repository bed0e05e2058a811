//! Opaque string identifiers for rooms and participants.
//!
//! Identifiers are compared by value and serialize as plain strings. The
//! simulator never interprets them.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_string_id!(
    /// Identifier of a logical audio room.
    RoomId
);

define_string_id!(
    /// Identifier of a participant attached to a room.
    ParticipantId
);

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn ids_compare_against_plain_strings() {
        let id = ParticipantId::from("me");
        assert_eq!(id, "me");
        assert_eq!(id.as_str(), "me");
        assert_eq!(id.to_string(), "me");
    }

    #[test]
    fn ids_serialize_transparently() {
        let room = RoomId::new(String::from("room-1"));
        assert_eq!(serde_json::to_string(&room).unwrap(), "\"room-1\"");
        let back: RoomId = serde_json::from_str("\"room-1\"").unwrap();
        assert_eq!(back, room);
    }

    #[test]
    fn map_lookup_by_str() {
        let mut levels = HashMap::new();
        levels.insert(ParticipantId::from("3"), 42_u8);
        assert_eq!(levels.get("3"), Some(&42));
    }
}
