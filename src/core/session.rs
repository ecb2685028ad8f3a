/// The dialogue session controller: Move / Choose / Purchase orchestration.
///
/// Wires together the event pool, condition evaluator, weighted selector,
/// effects applicator, and player store. Every mutation is persisted before
/// the outcome describing it is returned.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{ConfigError, EngineConfig};
use crate::core::content::{ContentError, ContentTables};
use crate::core::effects::EffectsApplicator;
use crate::core::pool::{EventPool, PoolState};
use crate::core::shop::Shop;
use crate::core::store::{MemoryStore, PlayerStore, StoreError};
use crate::schema::dialogue::{DialogueGraph, DialogueNode, DialogueOption};
use crate::schema::effect::{AppliedEffects, EffectDelta};
use crate::schema::event::{EncounterEvent, EncounterKind, EventInfo, GameEvent};
use crate::schema::ids::{ItemId, NodeId};
use crate::schema::item::ShopListing;
use crate::schema::player::PlayerSnapshot;

/// Id of the option synthesized for a node whose options are all hidden.
/// Choosing it closes the dialogue.
pub const ACKNOWLEDGE_OPTION_ID: &str = "acknowledge";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("action rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("player store error: {0}")]
    Store(#[from] StoreError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// An action the caller may not take right now. Session state and the
/// stored snapshot are unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("end of track: already at position {position}")]
    EndOfTrack { position: u32 },
    #[error("a dialogue is already open")]
    DialogueInProgress,
    #[error("not enough gold: need {needed}, have {available}")]
    InsufficientGold { needed: u64, available: u64 },
    #[error("option '{option}' requires item '{item}'")]
    MissingItem { option: String, item: ItemId },
    #[error("shop listing '{0}' is not for sale")]
    ListingUnavailable(String),
}

/// Where the controller stands between player actions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingChoice(ActiveDialogue),
}

/// The open dialogue: which event owns the graph and which node is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDialogue {
    pub event: GameEvent,
    pub node: NodeId,
}

/// An encounter as the UI sees it on the track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncounterMarker {
    pub info: EventInfo,
    pub kind: EncounterKind,
    pub position: u32,
}

impl From<&EncounterEvent> for EncounterMarker {
    fn from(encounter: &EncounterEvent) -> Self {
        Self {
            info: encounter.info.clone(),
            kind: encounter.kind,
            position: encounter.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveOutcome {
    /// Entry node of the triggered event, options already filtered.
    pub next_node: Option<DialogueNode>,
    pub player: PlayerSnapshot,
    pub encounter: Option<EncounterMarker>,
    pub step_event: Option<EventInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceOutcome {
    pub next_node: Option<DialogueNode>,
    /// Present only when the option changed the player.
    pub player: Option<PlayerSnapshot>,
    pub dialogue_complete: bool,
    pub applied: Option<AppliedEffects>,
}

impl ChoiceOutcome {
    fn closed() -> Self {
        Self {
            next_node: None,
            player: None,
            dialogue_complete: true,
            applied: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOutcome {
    pub listing: ShopListing,
    pub player: PlayerSnapshot,
    pub applied: AppliedEffects,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackOverview {
    pub track_length: u32,
    pub max_position: u32,
    /// Encounters that have not fired yet, ordered by position.
    pub encounters: Vec<EncounterMarker>,
}

/// One player's play session. Built via `JourneySession::builder()`.
pub struct JourneySession {
    content: ContentTables,
    config: EngineConfig,
    pool: EventPool,
    shop: Shop,
    store: Box<dyn PlayerStore>,
    clock: Box<dyn Clock>,
    player_key: String,
    rng: StdRng,
    state: SessionState,
}

/// Builder for constructing a `JourneySession`.
pub struct JourneySessionBuilder {
    content_files: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    player_key: String,
    seed: Option<u64>,
    /// Directly provided content (for testing without files).
    content: Option<ContentTables>,
    /// Directly provided config (for testing without files).
    config: Option<EngineConfig>,
    store: Option<Box<dyn PlayerStore>>,
    clock: Option<Box<dyn Clock>>,
}

impl JourneySession {
    pub fn builder() -> JourneySessionBuilder {
        JourneySessionBuilder {
            content_files: Vec::new(),
            config_file: None,
            player_key: "local".to_string(),
            seed: None,
            content: None,
            config: None,
            store: None,
            clock: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentTables {
        &self.content
    }

    pub fn player_key(&self) -> &str {
        &self.player_key
    }

    /// Current player, created on first access. Offline energy
    /// regeneration is applied and persisted here.
    pub fn player(&self) -> Result<PlayerSnapshot, SessionError> {
        let now = self.clock.now();
        match self.store.load(&self.player_key)? {
            Some(player) => match regenerate_energy(&player, now, &self.config) {
                Some(regenerated) => {
                    tracing::debug!(
                        "Regenerated energy {} -> {} for '{}'",
                        player.energy,
                        regenerated.energy,
                        self.player_key
                    );
                    Ok(self.store.save(&self.player_key, &regenerated)?)
                }
                None => Ok(player),
            },
            None => {
                let fresh = new_player(&self.player_key, now, &self.config);
                tracing::info!("Created player '{}'", fresh.name);
                Ok(self.store.save(&self.player_key, &fresh)?)
            }
        }
    }

    /// Advance one step and resolve what happens there.
    ///
    /// An encounter on the new position takes precedence; otherwise one
    /// eligible step event may be drawn. If the event has a dialogue the
    /// session moves to `AwaitingChoice` on its entry node.
    pub fn move_player(&mut self) -> Result<MoveOutcome, SessionError> {
        if matches!(self.state, SessionState::AwaitingChoice(_)) {
            return Err(Rejection::DialogueInProgress.into());
        }

        let current = self.player()?;
        if current.position >= self.config.max_position {
            return Err(Rejection::EndOfTrack {
                position: current.position,
            }
            .into());
        }

        let moved = PlayerSnapshot {
            position: current.position + 1,
            energy: current
                .energy
                .saturating_sub(self.config.energy_cost_per_step),
            updated_at: self.clock.now(),
            ..current
        };
        let player = self.store.save(&self.player_key, &moved)?;
        tracing::debug!("'{}' moved to position {}", self.player_key, player.position);

        if let Some(encounter) = self.pool.encounter_at(player.position) {
            let marker = EncounterMarker::from(&encounter);
            let entry = self.content.dialogues.node(encounter.dialogue.as_str()).cloned();
            let next_node = match entry {
                Some(node) => {
                    self.open(GameEvent::Encounter(encounter), &node, &player)
                }
                None => {
                    tracing::warn!(
                        "Encounter '{}' enters missing dialogue '{}'; closing",
                        encounter.info.id,
                        encounter.dialogue
                    );
                    None
                }
            };
            return Ok(MoveOutcome {
                next_node,
                player,
                encounter: Some(marker),
                step_event: None,
            });
        }

        let completed = self.pool.completed_ids();
        let step = self.pool.pick_step_event(&player, &completed, &mut self.rng);
        let (next_node, step_event) = match step {
            Some(step) => {
                let info = step.info.clone();
                let next_node = match step.entry_node().cloned() {
                    Some(node) => self.open(GameEvent::Step(step), &node, &player),
                    None => {
                        tracing::warn!("Step event '{}' has no dialogue; closing", info.id);
                        None
                    }
                };
                (next_node, Some(info))
            }
            None => (None, None),
        };

        Ok(MoveOutcome {
            next_node,
            player,
            encounter: None,
            step_event,
        })
    }

    /// Answer the open dialogue with `option_id` on node `node_id`.
    ///
    /// Unknown nodes or options close the dialogue instead of failing.
    /// Effects are applied and persisted before moving on; if the save
    /// fails the dialogue stays where it was.
    pub fn choose_option(
        &mut self,
        node_id: &str,
        option_id: &str,
    ) -> Result<ChoiceOutcome, SessionError> {
        let SessionState::AwaitingChoice(active) = &self.state else {
            tracing::warn!("Choice '{}/{}' made with no open dialogue", node_id, option_id);
            return Ok(ChoiceOutcome::closed());
        };
        let event = active.event.clone();
        if active.node.as_str() != node_id {
            tracing::warn!(
                "Choice targets node '{}' while '{}' is shown; closing",
                node_id,
                active.node
            );
            self.state = SessionState::Idle;
            return Ok(ChoiceOutcome::closed());
        }

        let Some(node) = self.graph_of(&event).node(node_id).cloned() else {
            tracing::warn!("Dialogue node '{}' not found in '{}'; closing", node_id, event.id());
            self.state = SessionState::Idle;
            return Ok(ChoiceOutcome::closed());
        };
        let Some(option) = node.option(option_id).cloned() else {
            if option_id != ACKNOWLEDGE_OPTION_ID {
                tracing::warn!("Option '{}' not found on node '{}'; closing", option_id, node_id);
            }
            self.state = SessionState::Idle;
            return Ok(ChoiceOutcome::closed());
        };

        let mut player = self.player()?;
        if !option.is_visible_to(&player) {
            if let Some(item) = option.requires {
                return Err(Rejection::MissingItem {
                    option: option.id,
                    item,
                }
                .into());
            }
        }

        let mut updated = None;
        let applied = match &option.effects {
            Some(delta) => {
                let (next, applied) = self.apply(&player, delta);
                player = self.store.save(&self.player_key, &next)?;
                updated = Some(player.clone());
                Some(applied)
            }
            None => None,
        };

        let next = option
            .next
            .as_ref()
            .and_then(|id| self.graph_of(&event).node(id.as_str()).cloned());
        if let (Some(missing), None) = (&option.next, &next) {
            tracing::warn!("Option '{}' leads to missing node '{}'; closing", option.id, missing);
        }

        let next_node = match next {
            Some(node) => self.open(event, &node, &player),
            None => {
                self.state = SessionState::Idle;
                None
            }
        };

        Ok(ChoiceOutcome {
            dialogue_complete: next_node.is_none(),
            next_node,
            player: updated,
            applied,
        })
    }

    /// Buy a shop listing: pay its cost and apply its effects.
    pub fn purchase(&mut self, listing_id: &str) -> Result<PurchaseOutcome, SessionError> {
        let Some(listing) = self.shop.listing(listing_id).cloned() else {
            return Err(Rejection::ListingUnavailable(listing_id.to_string()).into());
        };

        let player = self.player()?;
        if listing.cost > player.gold {
            return Err(Rejection::InsufficientGold {
                needed: listing.cost,
                available: player.gold,
            }
            .into());
        }

        let cost = i64::try_from(listing.cost).unwrap_or(i64::MAX);
        let delta = EffectDelta {
            gold: Some(listing.effects.gold.unwrap_or(0).saturating_sub(cost)),
            ..listing.effects.clone()
        };
        let (next, applied) = self.apply(&player, &delta);
        let player = self.store.save(&self.player_key, &next)?;
        self.shop.mark_sold(&listing.id);
        tracing::debug!("'{}' bought '{}' for {}", self.player_key, listing.id, listing.cost);

        Ok(PurchaseOutcome {
            listing,
            player,
            applied,
        })
    }

    pub fn shop_listings(&self) -> &[ShopListing] {
        self.shop.available()
    }

    /// Remaining encounters and track bounds for rendering.
    pub fn track(&self) -> TrackOverview {
        let mut encounters: Vec<EncounterMarker> = self
            .pool
            .remaining_encounters()
            .iter()
            .map(EncounterMarker::from)
            .collect();
        encounters.sort_by_key(|m| m.position);

        TrackOverview {
            track_length: self.config.track_length,
            max_position: self.config.max_position,
            encounters,
        }
    }

    pub fn pool_state(&self) -> PoolState {
        self.pool.state()
    }

    /// Resume a save's consumed events. Closes any open dialogue.
    pub fn restore_pool(&mut self, state: &PoolState) {
        self.pool.restore(state);
        self.state = SessionState::Idle;
    }

    /// Put every event and shop listing back. The player is kept.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.shop.reset();
        self.state = SessionState::Idle;
        tracing::info!("Session '{}' reset", self.player_key);
    }

    /// Replace the stored player, e.g. when loading an exported save.
    /// Closes any open dialogue.
    /// Stats and position are clamped to the configured bounds first.
    pub fn import_player(&mut self, snapshot: &PlayerSnapshot) -> Result<PlayerSnapshot, SessionError> {
        let bounded = PlayerSnapshot {
            health: snapshot.health.min(self.config.health_max),
            energy: snapshot.energy.min(self.config.energy_max),
            position: snapshot.position.min(self.config.max_position),
            ..snapshot.clone()
        };
        if bounded != *snapshot {
            tracing::warn!("Imported player '{}' was out of bounds; clamped", snapshot.name);
        }
        let saved = self.store.save(&self.player_key, &bounded)?;
        self.state = SessionState::Idle;
        tracing::info!("Imported player '{}' at position {}", saved.name, saved.position);
        Ok(saved)
    }

    /// Discard the save entirely and start over with a fresh player.
    pub fn restart(&mut self) -> Result<PlayerSnapshot, SessionError> {
        self.store.delete(&self.player_key)?;
        self.reset();
        self.player()
    }

    fn graph_of<'a>(&'a self, event: &'a GameEvent) -> &'a dyn DialogueGraph {
        match event {
            GameEvent::Encounter(_) => &self.content.dialogues,
            GameEvent::Step(step) => &step.dialogue,
        }
    }

    fn apply(&self, player: &PlayerSnapshot, delta: &EffectDelta) -> (PlayerSnapshot, AppliedEffects) {
        let (mut next, applied) =
            EffectsApplicator::new(&self.content.items, &self.config).apply_with_report(player, delta);
        next.updated_at = self.clock.now();
        (next, applied)
    }

    /// Enter `AwaitingChoice` on `node` and return it as presented.
    fn open(&mut self, event: GameEvent, node: &DialogueNode, player: &PlayerSnapshot) -> Option<DialogueNode> {
        let presented = present(node, player);
        self.state = SessionState::AwaitingChoice(ActiveDialogue {
            event,
            node: node.id.clone(),
        });
        Some(presented)
    }
}

/// Filter a node's options down to what `player` may pick. A node left
/// with nothing gets a single option that closes the dialogue.
pub fn present(node: &DialogueNode, player: &PlayerSnapshot) -> DialogueNode {
    let mut options: Vec<DialogueOption> = node
        .options
        .iter()
        .filter(|o| o.is_visible_to(player))
        .cloned()
        .collect();

    if options.is_empty() {
        options.push(DialogueOption {
            id: ACKNOWLEDGE_OPTION_ID.to_string(),
            text: "Continue".to_string(),
            requires: None,
            effects: None,
            next: None,
        });
    }

    DialogueNode {
        options,
        ..node.clone()
    }
}

/// Energy earned offline: whole hours since the last update times the
/// regeneration rate, capped at the maximum. `None` if less than an hour
/// has passed.
pub fn regenerate_energy(
    player: &PlayerSnapshot,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Option<PlayerSnapshot> {
    let hours = (now - player.updated_at).num_hours();
    if hours <= 0 {
        return None;
    }

    let gained = u64::try_from(hours)
        .unwrap_or(u64::MAX)
        .saturating_mul(u64::from(config.energy_regen_per_hour))
        .min(u64::from(config.energy_max));
    let energy = (u64::from(player.energy) + gained).min(u64::from(config.energy_max)) as u32;

    Some(PlayerSnapshot {
        energy,
        updated_at: now,
        ..player.clone()
    })
}

fn new_player(key: &str, now: DateTime<Utc>, config: &EngineConfig) -> PlayerSnapshot {
    PlayerSnapshot {
        id: u64::try_from(now.timestamp_millis()).unwrap_or(0),
        name: format!("Player_{}", key.chars().take(8).collect::<String>()),
        health: config.starting.health,
        energy: config.starting.energy,
        gold: config.starting.gold,
        cristal: config.starting.cristal,
        position: 0,
        items: Default::default(),
        flags: Default::default(),
        updated_at: now,
    }
}

impl JourneySessionBuilder {
    /// Add a content pack file. Later files override earlier ones by id.
    pub fn content_file(mut self, path: impl AsRef<Path>) -> Self {
        self.content_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn player_key(mut self, key: &str) -> Self {
        self.player_key = key.to_string();
        self
    }

    /// Fix the RNG seed. Without one the session seeds from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide content directly (for testing without files).
    pub fn with_content(mut self, content: ContentTables) -> Self {
        self.content = Some(content);
        self
    }

    /// Provide config directly (for testing without files).
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_store(mut self, store: impl PlayerStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn build(self) -> Result<JourneySession, SessionError> {
        let mut content = self.content.unwrap_or_default();
        for path in &self.content_files {
            content.merge(ContentTables::load_from_ron(path)?);
        }
        content.validate()?;
        for issue in content.lint() {
            tracing::warn!("Content: {}", issue);
        }

        let config = match (self.config, &self.config_file) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::load_from_ron(path)?,
            (None, None) => EngineConfig::default(),
        };
        config.validate()?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tracing::info!(
            "Session '{}' ready: {} encounters, {} step events, {} shop listings",
            self.player_key,
            content.encounters.len(),
            content.step_events.len(),
            content.shop.len()
        );

        Ok(JourneySession {
            pool: EventPool::from_content(&content),
            shop: Shop::new(content.shop.clone()),
            content,
            config,
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryStore::new())),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            player_key: self.player_key,
            rng,
            state: SessionState::Idle,
        })
    }
}
