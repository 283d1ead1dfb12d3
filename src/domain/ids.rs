//! Type-safe identifiers.
//!
//! Events, purchases, users and notifications are keyed by string newtypes
//! so that an event id cannot be passed where a purchase id is expected.
//! The remote API uses integer event ids and object-id strings for
//! purchases while the local backend generates UUIDs, so every identifier
//! deserializes from either a JSON string or a JSON integer.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Wire representation accepted for any identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Integer(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Creates a fresh random identifier (UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
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
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

string_id!(
    /// Identifier of a catalog event.
    EventId
);

string_id!(
    /// Identifier of a ticket purchase.
    PurchaseId
);

string_id!(
    /// Identifier of an authenticated user (the token `sub` claim).
    UserId
);

string_id!(
    /// Identifier of a notification.
    NotificationId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_integer_and_string() {
        let Ok(from_int) = serde_json::from_str::<EventId>("42") else {
            panic!("integer id should parse");
        };
        let Ok(from_str) = serde_json::from_str::<EventId>("\"42\"") else {
            panic!("string id should parse");
        };
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "42");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PurchaseId::new("683f6f41fcc44337553f27c9");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"683f6f41fcc44337553f27c9\"");
    }

    #[test]
    fn generate_creates_unique_uuid_strings() {
        let a = NotificationId::generate();
        let b = NotificationId::generate();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }
}
