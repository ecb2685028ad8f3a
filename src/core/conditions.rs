/// Step-event eligibility — a pure predicate over a player snapshot.

use rustc_hash::FxHashSet;

use crate::schema::condition::EventConditions;
use crate::schema::ids::EventId;
use crate::schema::player::PlayerSnapshot;

/// Returns true if every present clause of `conditions` holds for `player`.
///
/// `None` and the empty condition set are always eligible.
pub fn eligible(
    conditions: Option<&EventConditions>,
    player: &PlayerSnapshot,
    completed: &FxHashSet<EventId>,
) -> bool {
    let Some(c) = conditions else {
        return true;
    };

    if !c.requires_flags.iter().all(|flag| player.flag(flag)) {
        return false;
    }
    if !c.requires_items.iter().all(|item| player.has_item(item.as_str())) {
        return false;
    }

    if !within(player.gold, c.min_gold, c.max_gold)
        || !within(player.health, c.min_health, c.max_health)
        || !within(player.energy, c.min_energy, c.max_energy)
        || !within(player.cristal, c.min_cristal, c.max_cristal)
    {
        return false;
    }

    if let Some(range) = c.position {
        if !within(player.position, range.min, range.max) {
            return false;
        }
    }

    c.after_events.iter().all(|id| completed.contains(id))
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}
