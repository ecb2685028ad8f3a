/// Content tables — author-supplied events, dialogue, items, and shop
/// stock, loaded from RON and immutable at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::schema::dialogue::{DialogueGraph, DialogueNode};
use crate::schema::effect::EffectDelta;
use crate::schema::event::{EncounterEvent, StepEvent};
use crate::schema::ids::{ItemId, NodeId};
use crate::schema::item::{Item, ItemCatalog, ShopListing};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate {table} id '{id}'")]
    DuplicateId { table: &'static str, id: String },
    #[error("encounters '{first}' and '{second}' both occupy position {position}")]
    PositionTaken {
        position: u32,
        first: String,
        second: String,
    },
}

/// A non-fatal authoring problem. The engine degrades gracefully around
/// each of these, but they usually point at a typo in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentIssue {
    MissingEntryDialogue { encounter: String, dialogue: String },
    MissingNextNode { node: String, option: String, next: String },
    UnknownItem { context: String, item: String },
    UnknownAfterEvent { event: String, after: String },
    EmptyStepDialogue { event: String },
    NonPositiveWeight { event: String, weight: String },
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntryDialogue { encounter, dialogue } => write!(
                f,
                "encounter '{encounter}' enters dialogue '{dialogue}', which does not exist"
            ),
            Self::MissingNextNode { node, option, next } => write!(
                f,
                "option '{option}' of node '{node}' leads to '{next}', which does not exist in its graph"
            ),
            Self::UnknownItem { context, item } => {
                write!(f, "{context} references item '{item}', which is not in the catalog")
            }
            Self::UnknownAfterEvent { event, after } => {
                write!(f, "step event '{event}' waits for unknown event '{after}'")
            }
            Self::EmptyStepDialogue { event } => {
                write!(f, "step event '{event}' has no dialogue nodes")
            }
            Self::NonPositiveWeight { event, weight } => {
                write!(f, "step event '{event}' has non-positive weight {weight}")
            }
        }
    }
}

/// Every piece of static content a play session draws on.
#[derive(Debug, Clone, Default)]
pub struct ContentTables {
    pub items: ItemCatalog,
    /// Shared dialogue table used by encounters.
    pub dialogues: HashMap<NodeId, DialogueNode>,
    pub encounters: Vec<EncounterEvent>,
    pub step_events: Vec<StepEvent>,
    pub shop: Vec<ShopListing>,
}

// On disk every table is a list; the dialogue table becomes a map on load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RonContent {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    dialogues: Vec<DialogueNode>,
    #[serde(default)]
    encounters: Vec<EncounterEvent>,
    #[serde(default)]
    step_events: Vec<StepEvent>,
    #[serde(default)]
    shop: Vec<ShopListing>,
}

impl ContentTables {
    /// Load a content pack from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ContentTables, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a content pack from a RON string and validate it.
    pub fn parse_ron(input: &str) -> Result<ContentTables, ContentError> {
        let raw: RonContent = ron::from_str(input)?;

        ensure_unique("item", raw.items.iter().map(|i| i.id.as_str()))?;
        ensure_unique("dialogue", raw.dialogues.iter().map(|d| d.id.as_str()))?;
        ensure_unique("shop listing", raw.shop.iter().map(|l| l.id.as_str()))?;

        let tables = ContentTables {
            items: ItemCatalog::new(raw.items),
            dialogues: raw
                .dialogues
                .into_iter()
                .map(|node| (node.id.clone(), node))
                .collect(),
            encounters: raw.encounters,
            step_events: raw.step_events,
            shop: raw.shop,
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Layer another pack over this one. Entries from `other` replace
    /// entries in `self` with the same id.
    pub fn merge(&mut self, other: ContentTables) {
        for item in other.items.iter() {
            self.items.insert(item.clone());
        }
        self.dialogues.extend(other.dialogues);

        for encounter in other.encounters {
            match self.encounters.iter_mut().find(|e| e.info.id == encounter.info.id) {
                Some(existing) => *existing = encounter,
                None => self.encounters.push(encounter),
            }
        }
        for step in other.step_events {
            match self.step_events.iter_mut().find(|e| e.info.id == step.info.id) {
                Some(existing) => *existing = step,
                None => self.step_events.push(step),
            }
        }
        for listing in other.shop {
            match self.shop.iter_mut().find(|l| l.id == listing.id) {
                Some(existing) => *existing = listing,
                None => self.shop.push(listing),
            }
        }
    }

    /// Structural checks that make content unusable: event ids unique
    /// across encounters and step events, node ids unique within each
    /// step event's graph, and at most one encounter per position.
    pub fn validate(&self) -> Result<(), ContentError> {
        ensure_unique(
            "event",
            self.encounters
                .iter()
                .map(|e| e.info.id.as_str())
                .chain(self.step_events.iter().map(|e| e.info.id.as_str())),
        )?;
        for step in &self.step_events {
            ensure_unique("dialogue", step.dialogue.iter().map(|d| d.id.as_str()))?;
        }

        let mut by_position: HashMap<u32, &str> = HashMap::new();
        for encounter in &self.encounters {
            if let Some(first) = by_position.insert(encounter.position, encounter.info.id.as_str()) {
                return Err(ContentError::PositionTaken {
                    position: encounter.position,
                    first: first.to_string(),
                    second: encounter.info.id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Collect dangling references and other authoring slips.
    pub fn lint(&self) -> Vec<ContentIssue> {
        let mut issues = Vec::new();

        for encounter in &self.encounters {
            if self.dialogues.node(encounter.dialogue.as_str()).is_none() {
                issues.push(ContentIssue::MissingEntryDialogue {
                    encounter: encounter.info.id.to_string(),
                    dialogue: encounter.dialogue.to_string(),
                });
            }
        }

        let mut shared: Vec<&DialogueNode> = self.dialogues.values().collect();
        shared.sort_by(|a, b| a.id.cmp(&b.id));
        for node in shared {
            self.lint_node(node, &self.dialogues, &mut issues);
        }

        let event_ids: Vec<&str> = self
            .encounters
            .iter()
            .map(|e| e.info.id.as_str())
            .chain(self.step_events.iter().map(|e| e.info.id.as_str()))
            .collect();

        for step in &self.step_events {
            let id = step.info.id.to_string();
            if step.dialogue.is_empty() {
                issues.push(ContentIssue::EmptyStepDialogue { event: id.clone() });
            }
            if !(step.weight > 0.0) {
                issues.push(ContentIssue::NonPositiveWeight {
                    event: id.clone(),
                    weight: step.weight.to_string(),
                });
            }
            if let Some(conditions) = &step.conditions {
                for item in &conditions.requires_items {
                    self.check_item(format!("conditions of step event '{id}'"), item, &mut issues);
                }
                for after in &conditions.after_events {
                    if !event_ids.contains(&after.as_str()) {
                        issues.push(ContentIssue::UnknownAfterEvent {
                            event: id.clone(),
                            after: after.to_string(),
                        });
                    }
                }
            }
            for node in &step.dialogue {
                self.lint_node(node, &step.dialogue, &mut issues);
            }
        }

        for listing in &self.shop {
            self.check_effects(
                format!("shop listing '{}'", listing.id),
                &listing.effects,
                &mut issues,
            );
        }

        issues
    }

    fn lint_node<G: DialogueGraph + ?Sized>(
        &self,
        node: &DialogueNode,
        graph: &G,
        issues: &mut Vec<ContentIssue>,
    ) {
        for option in &node.options {
            let context = format!("option '{}' of node '{}'", option.id, node.id);
            if let Some(next) = &option.next {
                if graph.node(next.as_str()).is_none() {
                    issues.push(ContentIssue::MissingNextNode {
                        node: node.id.to_string(),
                        option: option.id.clone(),
                        next: next.to_string(),
                    });
                }
            }
            if let Some(item) = &option.requires {
                self.check_item(context.clone(), item, issues);
            }
            if let Some(effects) = &option.effects {
                self.check_effects(context, effects, issues);
            }
        }
    }

    fn check_effects(&self, context: String, effects: &EffectDelta, issues: &mut Vec<ContentIssue>) {
        for item in effects.items_gain.iter().chain(&effects.items_lose) {
            self.check_item(context.clone(), item, issues);
        }
    }

    fn check_item(&self, context: String, item: &ItemId, issues: &mut Vec<ContentIssue>) {
        if !self.items.contains(item.as_str()) {
            issues.push(ContentIssue::UnknownItem {
                context,
                item: item.to_string(),
            });
        }
    }
}

fn ensure_unique<'a>(
    table: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ContentError> {
    let mut seen = rustc_hash::FxHashSet::default();
    for id in ids {
        if !seen.insert(id) {
            return Err(ContentError::DuplicateId {
                table,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
