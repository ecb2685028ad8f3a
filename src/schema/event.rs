use serde::{Deserialize, Serialize};

use super::condition::EventConditions;
use super::dialogue::DialogueNode;
use super::ids::{EventId, NodeId};

/// Fields shared by every scripted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form theme tag, e.g. "fraud/phishing".
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// What the player meets at an encounter's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterKind {
    Npc,
    Treasure,
    Shop,
}

impl EncounterKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Npc => "npc",
            Self::Treasure => "treasure",
            Self::Shop => "shop",
        }
    }
}

/// A scripted event pinned to one track position. Fires at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterEvent {
    pub info: EventInfo,
    pub kind: EncounterKind,
    pub position: u32,
    /// Entry node in the shared dialogue table.
    pub dialogue: NodeId,
}

/// A randomly drawn, one-shot event that can fire on any step without an
/// encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub info: EventInfo,
    #[serde(default)]
    pub conditions: Option<EventConditions>,
    /// Relative selection weight; authors must keep it positive.
    pub weight: f64,
    /// Embedded dialogue graph. The first node is the entry point.
    #[serde(default)]
    pub dialogue: Vec<DialogueNode>,
}

impl StepEvent {
    pub fn entry_node(&self) -> Option<&DialogueNode> {
        self.dialogue.first()
    }
}

/// Either kind of scripted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Encounter(EncounterEvent),
    Step(StepEvent),
}

impl GameEvent {
    pub fn info(&self) -> &EventInfo {
        match self {
            Self::Encounter(e) => &e.info,
            Self::Step(e) => &e.info,
        }
    }

    pub fn id(&self) -> &EventId {
        &self.info().id
    }
}
