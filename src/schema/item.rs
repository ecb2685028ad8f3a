use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::effect::EffectDelta;
use super::ids::ItemId;

/// A catalog entry. Only ids present in the catalog can ever enter a
/// player's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Lookup table over all known items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemCatalog {
    items: HashMap<ItemId, Item>,
}

impl ItemCatalog {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn insert(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

/// Something the shop sells once. Buying it costs `cost` gold on top of
/// whatever `effects` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub cost: u64,
    #[serde(default)]
    pub effects: EffectDelta,
    #[serde(default)]
    pub image: Option<String>,
}
