//! Stable record identifiers
//!
//! Wardrobe items and outfits are keyed by opaque strings. Fresh ids are
//! UUID v4; ids loaded from a library or seeded by the demo wardrobe
//! (e.g. `def-person-1`) are kept verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new unique id
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Wrap an existing id string
            pub fn from_raw(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the id string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_raw(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a wardrobe item (person or garment)
    ItemId
);

string_id!(
    /// Identifier of an outfit record
    OutfitId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = ItemId::new();
        let id2 = ItemId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_from_raw_keeps_text() {
        let id = ItemId::from_raw("def-person-1");
        assert_eq!(id.as_str(), "def-person-1");
        assert_eq!(id.to_string(), "def-person-1");
        assert_eq!(format!("{:?}", id), "ItemId(def-person-1)");
    }

    #[test]
    fn test_serde_transparent() {
        let id = OutfitId::from_raw("o-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"o-7\"");
        let back: OutfitId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
