/// Event pools — the available/consumed partition of one-shot content.

use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::conditions::eligible;
use crate::core::content::ContentTables;
use crate::core::selector::select;
use crate::schema::event::{EncounterEvent, StepEvent};
use crate::schema::ids::EventId;
use crate::schema::item::ShopListing;
use crate::schema::player::PlayerSnapshot;

/// Content that can be consumed exactly once.
pub trait Pooled: Clone {
    fn pool_id(&self) -> &str;
}

impl Pooled for EncounterEvent {
    fn pool_id(&self) -> &str {
        self.info.id.as_str()
    }
}

impl Pooled for StepEvent {
    fn pool_id(&self) -> &str {
        self.info.id.as_str()
    }
}

impl Pooled for ShopListing {
    fn pool_id(&self) -> &str {
        &self.id
    }
}

/// Available and consumed entries of one content category. An entry moves
/// from available to consumed at most once and only `reset` brings it back.
#[derive(Debug, Clone)]
pub struct OneShot<T> {
    initial: Vec<T>,
    available: Vec<T>,
    consumed: Vec<T>,
}

impl<T: Pooled> OneShot<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self {
            available: entries.clone(),
            initial: entries,
            consumed: Vec::new(),
        }
    }

    pub fn available(&self) -> &[T] {
        &self.available
    }

    pub fn consumed(&self) -> &[T] {
        &self.consumed
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.available.iter().find(|e| e.pool_id() == id)
    }

    /// Move the entry with `id` to consumed and return it.
    pub fn take(&mut self, id: &str) -> Option<T> {
        let index = self.available.iter().position(|e| e.pool_id() == id)?;
        let entry = self.available.remove(index);
        self.consumed.push(entry.clone());
        Some(entry)
    }

    /// Move the first entry matching `predicate` to consumed and return it.
    pub fn take_where(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let id = self.available.iter().find(|e| predicate(e))?.pool_id().to_string();
        self.take(&id)
    }

    pub fn consumed_ids(&self) -> impl Iterator<Item = &str> {
        self.consumed.iter().map(|e| e.pool_id())
    }

    pub fn reset(&mut self) {
        self.available = self.initial.clone();
        self.consumed.clear();
    }

    /// Reset, then consume every listed id that exists. Unknown ids are
    /// skipped.
    pub fn restore<'a>(&mut self, consumed: impl IntoIterator<Item = &'a str>) {
        self.reset();
        for id in consumed {
            if self.take(id).is_none() {
                tracing::warn!("Ignoring unknown consumed id '{}' while restoring pool", id);
            }
        }
    }
}

/// Serializable record of which events a save has already used up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    #[serde(default)]
    pub consumed_encounters: Vec<EventId>,
    #[serde(default)]
    pub consumed_steps: Vec<EventId>,
}

/// Tracks, per category, which encounters and step events can still fire.
#[derive(Debug, Clone)]
pub struct EventPool {
    encounters: OneShot<EncounterEvent>,
    steps: OneShot<StepEvent>,
}

impl EventPool {
    pub fn new(encounters: Vec<EncounterEvent>, steps: Vec<StepEvent>) -> Self {
        Self {
            encounters: OneShot::new(encounters),
            steps: OneShot::new(steps),
        }
    }

    pub fn from_content(content: &ContentTables) -> Self {
        Self::new(content.encounters.clone(), content.step_events.clone())
    }

    /// The encounter pinned to `position`, if it hasn't fired yet.
    /// Consumes it.
    pub fn encounter_at(&mut self, position: u32) -> Option<EncounterEvent> {
        let found = self.encounters.take_where(|e| e.position == position)?;
        tracing::debug!("Encounter '{}' fired at position {}", found.info.id, position);
        Some(found)
    }

    /// Draw one eligible step event by weight. Consumes it.
    pub fn pick_step_event<R: Rng>(
        &mut self,
        player: &PlayerSnapshot,
        completed: &FxHashSet<EventId>,
        rng: &mut R,
    ) -> Option<StepEvent> {
        let candidates: Vec<(&str, f64)> = self
            .steps
            .available()
            .iter()
            .filter(|e| eligible(e.conditions.as_ref(), player, completed))
            .map(|e| (e.pool_id(), e.weight))
            .collect();

        let eligible_count = candidates.len();
        let id = select(&candidates, rng)?.to_string();
        let picked = self.steps.take(&id)?;
        tracing::debug!(
            "Step event '{}' drawn from {} eligible",
            picked.info.id,
            eligible_count
        );
        Some(picked)
    }

    /// Ids of every consumed encounter and step event.
    pub fn completed_ids(&self) -> FxHashSet<EventId> {
        self.encounters
            .consumed_ids()
            .chain(self.steps.consumed_ids())
            .map(EventId::from)
            .collect()
    }

    pub fn remaining_encounters(&self) -> &[EncounterEvent] {
        self.encounters.available()
    }

    pub fn available_steps(&self) -> &[StepEvent] {
        self.steps.available()
    }

    pub fn reset(&mut self) {
        self.encounters.reset();
        self.steps.reset();
    }

    pub fn state(&self) -> PoolState {
        PoolState {
            consumed_encounters: self.encounters.consumed_ids().map(EventId::from).collect(),
            consumed_steps: self.steps.consumed_ids().map(EventId::from).collect(),
        }
    }

    pub fn restore(&mut self, state: &PoolState) {
        self.encounters
            .restore(state.consumed_encounters.iter().map(EventId::as_str));
        self.steps
            .restore(state.consumed_steps.iter().map(EventId::as_str));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::condition::EventConditions;
    use crate::schema::event::{EncounterKind, EventInfo};
    use crate::schema::ids::NodeId;
    use chrono::{DateTime, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn info(id: &str) -> EventInfo {
        EventInfo {
            id: EventId::from(id),
            title: id.to_string(),
            description: String::new(),
            topic: String::new(),
            image: None,
        }
    }

    fn encounter(id: &str, position: u32) -> EncounterEvent {
        EncounterEvent {
            info: info(id),
            kind: EncounterKind::Npc,
            position,
            dialogue: NodeId::from("D1"),
        }
    }

    fn step(id: &str, conditions: Option<EventConditions>) -> StepEvent {
        StepEvent {
            info: info(id),
            conditions,
            weight: 1.0,
            dialogue: Vec::new(),
        }
    }

    fn make_player() -> PlayerSnapshot {
        PlayerSnapshot {
            id: 1,
            name: "Player".to_string(),
            health: 100,
            energy: 100,
            gold: 50,
            cristal: 0,
            position: 4,
            items: Default::default(),
            flags: HashMap::new(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn make_pool() -> EventPool {
        EventPool::new(
            vec![encounter("OBJ01", 5), encounter("OBJ02", 10)],
            vec![
                step("E001", None),
                step(
                    "E002",
                    Some(EventConditions {
                        min_gold: Some(100),
                        ..Default::default()
                    }),
                ),
            ],
        )
    }

    #[test]
    fn encounter_fires_once() {
        let mut pool = make_pool();
        assert_eq!(pool.encounter_at(5).unwrap().info.id.as_str(), "OBJ01");
        assert!(pool.encounter_at(5).is_none());
        assert_eq!(pool.remaining_encounters().len(), 1);
    }

    #[test]
    fn no_encounter_at_empty_position() {
        let mut pool = make_pool();
        assert!(pool.encounter_at(7).is_none());
        assert_eq!(pool.remaining_encounters().len(), 2);
    }

    #[test]
    fn step_events_filtered_and_consumed() {
        let mut pool = make_pool();
        let mut rng = StdRng::seed_from_u64(3);
        let player = make_player();

        let first = pool
            .pick_step_event(&player, &FxHashSet::default(), &mut rng)
            .unwrap();
        assert_eq!(first.info.id.as_str(), "E001");
        // E002 needs 100 gold; nothing else is eligible.
        assert!(pool
            .pick_step_event(&player, &FxHashSet::default(), &mut rng)
            .is_none());

        let rich = PlayerSnapshot {
            gold: 150,
            ..make_player()
        };
        let second = pool
            .pick_step_event(&rich, &FxHashSet::default(), &mut rng)
            .unwrap();
        assert_eq!(second.info.id.as_str(), "E002");
        assert!(pool.available_steps().is_empty());
    }

    #[test]
    fn completed_ids_cover_both_categories() {
        let mut pool = make_pool();
        let mut rng = StdRng::seed_from_u64(3);
        pool.encounter_at(10);
        pool.pick_step_event(&make_player(), &FxHashSet::default(), &mut rng);
        let completed = pool.completed_ids();
        assert!(completed.contains("OBJ02"));
        assert!(completed.contains("E001"));
        assert_eq!(completed.len(), 2);
    }

    #[test]
    fn reset_restores_everything() {
        let mut pool = make_pool();
        pool.encounter_at(5);
        pool.encounter_at(10);
        pool.reset();
        assert_eq!(pool.remaining_encounters().len(), 2);
        assert!(pool.completed_ids().is_empty());
        assert!(pool.encounter_at(5).is_some());
    }

    #[test]
    fn state_restore_round_trip() {
        let mut pool = make_pool();
        pool.encounter_at(5);
        let state = pool.state();
        assert_eq!(state.consumed_encounters, vec![EventId::from("OBJ01")]);

        let mut resumed = make_pool();
        resumed.restore(&PoolState {
            consumed_steps: vec![EventId::from("E999")],
            ..state
        });
        assert!(resumed.encounter_at(5).is_none());
        assert!(resumed.encounter_at(10).is_some());
        assert_eq!(resumed.available_steps().len(), 2);
    }

    #[test]
    fn one_shot_take_and_reset() {
        let mut shelf = OneShot::new(vec![encounter("A", 1), encounter("B", 2)]);
        assert!(shelf.get("A").is_some());
        assert_eq!(shelf.take("A").unwrap().position, 1);
        assert!(shelf.get("A").is_none());
        assert!(shelf.take("A").is_none());
        assert_eq!(shelf.consumed().len(), 1);
        shelf.reset();
        assert_eq!(shelf.available().len(), 2);
        assert!(shelf.consumed().is_empty());
    }
}
