/// Effect application — maps a snapshot and an effect delta to a new snapshot.
///
/// Total and deterministic: every clamp is infallible and nothing is
/// persisted here.

use crate::core::config::EngineConfig;
use crate::schema::effect::{AppliedEffects, EffectDelta};
use crate::schema::item::ItemCatalog;
use crate::schema::player::PlayerSnapshot;

/// Applies effect deltas under the configured stat ceilings, validating
/// gained items against the catalog.
#[derive(Debug, Clone, Copy)]
pub struct EffectsApplicator<'a> {
    catalog: &'a ItemCatalog,
    health_max: u32,
    energy_max: u32,
}

impl<'a> EffectsApplicator<'a> {
    pub fn new(catalog: &'a ItemCatalog, config: &EngineConfig) -> Self {
        Self {
            catalog,
            health_max: config.health_max,
            energy_max: config.energy_max,
        }
    }

    /// Apply `delta` to `player`, returning the new snapshot.
    pub fn apply(&self, player: &PlayerSnapshot, delta: &EffectDelta) -> PlayerSnapshot {
        self.apply_with_report(player, delta).0
    }

    /// Apply `delta` and also report what changed.
    ///
    /// Items are gained before they are lost, so an id in both lists ends
    /// up absent. Flags are set before they are unset, so unset wins.
    pub fn apply_with_report(
        &self,
        player: &PlayerSnapshot,
        delta: &EffectDelta,
    ) -> (PlayerSnapshot, AppliedEffects) {
        let mut next = player.clone();
        let mut report = AppliedEffects {
            health: delta.health.unwrap_or(0),
            energy: delta.energy.unwrap_or(0),
            gold: delta.gold.unwrap_or(0),
            cristal: delta.cristal.unwrap_or(0),
            note: delta.note.clone().unwrap_or_default(),
            flags_set: delta.flags_set.clone(),
            flags_unset: delta.flags_unset.clone(),
            ..Default::default()
        };

        next.health = shift_bounded(player.health, delta.health, self.health_max);
        next.energy = shift_bounded(player.energy, delta.energy, self.energy_max);
        next.gold = shift_unbounded(player.gold, delta.gold);
        next.cristal = shift_unbounded(player.cristal, delta.cristal);

        for id in &delta.items_gain {
            match self.catalog.get(id.as_str()) {
                Some(item) => {
                    next.items.insert(id.clone());
                    report.items_gained.push(item.clone());
                }
                None => {
                    tracing::warn!("Item '{}' is not in the catalog; not added to inventory", id);
                }
            }
        }
        for id in &delta.items_lose {
            next.items.remove(id);
            if let Some(item) = self.catalog.get(id.as_str()) {
                report.items_lost.push(item.clone());
            }
        }

        for flag in &delta.flags_set {
            next.flags.insert(flag.clone(), true);
        }
        for flag in &delta.flags_unset {
            next.flags.insert(flag.clone(), false);
        }

        (next, report)
    }
}

fn shift_bounded(value: u32, delta: Option<i64>, max: u32) -> u32 {
    let shifted = i64::from(value).saturating_add(delta.unwrap_or(0));
    shifted.clamp(0, i64::from(max)) as u32
}

fn shift_unbounded(value: u64, delta: Option<i64>) -> u64 {
    let shifted = i128::from(value) + i128::from(delta.unwrap_or(0));
    shifted.clamp(0, i128::from(u64::MAX)) as u64
}
