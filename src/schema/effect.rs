use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ItemId;
use super::item::Item;

/// A sparse set of changes applied to a player snapshot when a dialogue
/// option is chosen or a shop listing is bought.
///
/// A missing numeric field means "no change" and is kept distinct from an
/// explicit zero so UIs can tell the two apart. Numerically both leave the
/// stat untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cristal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items_gain: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items_lose: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags_set: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags_unset: Vec<String>,
}

impl EffectDelta {
    /// Returns true if applying this delta can't change anything.
    pub fn is_empty(&self) -> bool {
        self.health.is_none()
            && self.energy.is_none()
            && self.gold.is_none()
            && self.cristal.is_none()
            && self.note.is_none()
            && self.items_gain.is_empty()
            && self.items_lose.is_empty()
            && self.flags_set.is_empty()
            && self.flags_unset.is_empty()
    }
}

/// What an effect application actually did, for UI feedback.
///
/// Numeric fields are the requested deltas with absence read as zero.
/// Item lists only hold catalog entries; unknown ids are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffects {
    pub health: i64,
    pub energy: i64,
    pub gold: i64,
    pub cristal: i64,
    pub note: String,
    pub items_gained: Vec<Item>,
    pub items_lost: Vec<Item>,
    pub flags_set: Vec<String>,
    pub flags_unset: Vec<String>,
}

impl fmt::Display for AppliedEffects {
    /// One-line summary, e.g. `Changes: +10 gold, -5 health, +1 items`.
    /// Renders nothing when there is nothing to report.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        for (amount, label) in [
            (self.gold, "gold"),
            (self.health, "health"),
            (self.energy, "energy"),
            (self.cristal, "cristal"),
        ] {
            if amount != 0 {
                parts.push(format!("{amount:+} {label}"));
            }
        }
        if !self.items_gained.is_empty() {
            parts.push(format!("+{} items", self.items_gained.len()));
        }
        if !self.items_lost.is_empty() {
            parts.push(format!("-{} items", self.items_lost.len()));
        }
        if !self.flags_set.is_empty() {
            parts.push(format!("+{} flags", self.flags_set.len()));
        }
        if !self.note.is_empty() {
            parts.push(self.note.clone());
        }

        if parts.is_empty() {
            return Ok(());
        }
        write!(f, "Changes: {}", parts.join(", "))
    }
}
