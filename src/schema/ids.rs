use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of an item in the catalog.
    ItemId
);

string_id!(
    /// Identifier shared by encounters and step events.
    EventId
);

string_id!(
    /// Identifier of a dialogue node.
    NodeId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn ids_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(NodeId::from("D1"), 1);
        assert_eq!(map.get("D1"), Some(&1));
        assert_eq!(map.get("D2"), None);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ItemId::new("lantern");
        assert_eq!(ron::to_string(&id).unwrap(), "\"lantern\"");
        let back: ItemId = ron::from_str("\"lantern\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "lantern");
    }
}
