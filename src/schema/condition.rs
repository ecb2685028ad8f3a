use serde::{Deserialize, Serialize};

use super::ids::{EventId, ItemId};

/// Eligibility clauses for a step event. All present clauses must hold;
/// an absent clause imposes no constraint. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventConditions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_items: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_gold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gold: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_energy: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_energy: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cristal: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cristal: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionRange>,
    /// Event ids that must already be completed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_events: Vec<EventId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRange {
    #[serde(default)]
    pub min: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
}
