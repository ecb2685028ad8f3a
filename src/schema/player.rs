use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ids::ItemId;

/// The player's full mutable state at one instant. This is the unit of
/// persistence: the store keeps exactly one snapshot per player key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: u64,
    pub name: String,
    /// 0..=health_max.
    pub health: u32,
    /// 0..=energy_max.
    pub energy: u32,
    pub gold: u64,
    pub cristal: u64,
    /// Step index along the track, never above the configured maximum.
    pub position: u32,
    #[serde(default)]
    pub items: FxHashSet<ItemId>,
    /// Narrative milestones. A flag that was never set reads as false.
    #[serde(default)]
    pub flags: HashMap<String, bool>,
    /// Last mutation time; drives offline energy regeneration.
    pub updated_at: DateTime<Utc>,
}

impl PlayerSnapshot {
    /// Returns true if the player currently holds the item.
    pub fn has_item(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    /// Returns true if the flag is set to true.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_player() -> PlayerSnapshot {
        PlayerSnapshot {
            id: 7,
            name: "Player_abc".to_string(),
            health: 100,
            energy: 100,
            gold: 100,
            cristal: 0,
            position: 0,
            items: [ItemId::from("lantern")].into_iter().collect(),
            flags: HashMap::from([
                ("met_friend".to_string(), true),
                ("spotted_scam".to_string(), false),
            ]),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn item_ownership() {
        let player = make_player();
        assert!(player.has_item("lantern"));
        assert!(!player.has_item("compass"));
    }

    #[test]
    fn flags_default_to_false() {
        let player = make_player();
        assert!(player.flag("met_friend"));
        assert!(!player.flag("spotted_scam"));
        assert!(!player.flag("never_mentioned"));
    }

    #[test]
    fn snapshot_ron_round_trip() {
        let player = make_player();
        let text = ron::to_string(&player).unwrap();
        let back: PlayerSnapshot = ron::from_str(&text).unwrap();
        assert_eq!(back, player);
    }
}
