use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::effect::EffectDelta;
use super::ids::{ItemId, NodeId};
use super::player::PlayerSnapshot;

/// One screen of dialogue: who speaks, what they say, and what the player
/// may answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: NodeId,
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<DialogueOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueOption {
    pub id: String,
    pub text: String,
    /// Shown only to players holding this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<NodeId>,
}

impl DialogueNode {
    pub fn option(&self, id: &str) -> Option<&DialogueOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

impl DialogueOption {
    /// Returns true if the item gate (if any) is satisfied by `player`.
    pub fn is_visible_to(&self, player: &PlayerSnapshot) -> bool {
        match &self.requires {
            Some(item) => player.has_item(item.as_str()),
            None => true,
        }
    }
}

/// Anything dialogue nodes can be looked up in. Encounters resolve against
/// the shared dialogue table, step events against their embedded graph.
pub trait DialogueGraph {
    fn node(&self, id: &str) -> Option<&DialogueNode>;
}

impl DialogueGraph for HashMap<NodeId, DialogueNode> {
    fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.get(id)
    }
}

impl DialogueGraph for [DialogueNode] {
    fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.iter().find(|n| n.id.as_str() == id)
    }
}

impl DialogueGraph for Vec<DialogueNode> {
    fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.as_slice().node(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn make_node() -> DialogueNode {
        DialogueNode {
            id: NodeId::from("D1"),
            speaker: "Ferryman".to_string(),
            text: "The fog is thick tonight.".to_string(),
            options: vec![
                DialogueOption {
                    id: "O1".to_string(),
                    text: "Pay the toll".to_string(),
                    requires: None,
                    effects: Some(EffectDelta {
                        gold: Some(-10),
                        ..Default::default()
                    }),
                    next: Some(NodeId::from("D2")),
                },
                DialogueOption {
                    id: "O2".to_string(),
                    text: "Light the lantern".to_string(),
                    requires: Some(ItemId::from("lantern")),
                    effects: None,
                    next: None,
                },
            ],
        }
    }

    fn make_player(items: &[&str]) -> PlayerSnapshot {
        PlayerSnapshot {
            id: 1,
            name: "Player".to_string(),
            health: 100,
            energy: 100,
            gold: 100,
            cristal: 0,
            position: 0,
            items: items.iter().map(|i| ItemId::from(*i)).collect(),
            flags: HashMap::new(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn option_lookup() {
        let node = make_node();
        assert_eq!(node.option("O1").unwrap().text, "Pay the toll");
        assert!(node.option("O9").is_none());
    }

    #[test]
    fn item_gate_visibility() {
        let node = make_node();
        let gated = node.option("O2").unwrap();
        assert!(!gated.is_visible_to(&make_player(&[])));
        assert!(gated.is_visible_to(&make_player(&["lantern"])));
        assert!(node.option("O1").unwrap().is_visible_to(&make_player(&[])));
    }

    #[test]
    fn graph_lookup_table_and_embedded() {
        let node = make_node();
        let table: HashMap<NodeId, DialogueNode> =
            HashMap::from([(node.id.clone(), node.clone())]);
        let embedded = vec![node];
        assert!(table.node("D1").is_some());
        assert!(embedded.node("D1").is_some());
        assert!(table.node("D2").is_none());
        assert!(embedded.node("D2").is_none());
    }
}
