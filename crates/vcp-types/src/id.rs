use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId {
                        kind: $kind,
                        reason: e.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Identifier of a pool participant.
    MinerId,
    "miner"
);

uuid_id!(
    /// Identifier of a virtual channel between the operator and one miner.
    ChannelId,
    "channel"
);

uuid_id!(
    /// Identifier of a single payment update inside a channel.
    PaymentId,
    "payment"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(MinerId::new(), MinerId::new());
        assert_ne!(ChannelId::new(), ChannelId::new());
    }

    #[test]
    fn short_id_is_8_chars() {
        assert_eq!(PaymentId::new().short_id().len(), 8);
    }

    #[test]
    fn parse_display_roundtrip() {
        let id = ChannelId::new();
        let parsed: ChannelId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<MinerId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidId { kind: "miner", .. }));
    }

    #[test]
    fn debug_uses_type_name() {
        let id = MinerId::new();
        assert!(format!("{id:?}").starts_with("MinerId("));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = MinerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
