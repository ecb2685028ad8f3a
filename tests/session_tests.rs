/// Session integration tests — moves, dialogues, purchases, and persistence
/// against the fixture content pack.

use chrono::{DateTime, Duration, Utc};
use journey_engine::core::clock::FixedClock;
use journey_engine::core::config::EngineConfig;
use journey_engine::core::content::ContentTables;
use journey_engine::core::session::{
    JourneySession, Rejection, SessionError, SessionState, ACKNOWLEDGE_OPTION_ID,
};
use journey_engine::core::store::{FileStore, MemoryStore, PlayerStore, StoreError};
use journey_engine::schema::player::PlayerSnapshot;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const CONTENT: &str = "tests/fixtures/test_content.ron";
const CONFIG: &str = "tests/fixtures/test_config.ron";

fn now() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
}

fn make_player(position: u32, gold: u64) -> PlayerSnapshot {
    PlayerSnapshot {
        id: 42,
        name: "Player_tester".to_string(),
        health: 100,
        energy: 100,
        gold,
        cristal: 0,
        position,
        items: Default::default(),
        flags: Default::default(),
        updated_at: now(),
    }
}

fn session_with(store: impl PlayerStore + 'static) -> JourneySession {
    JourneySession::builder()
        .content_file(CONTENT)
        .player_key("tester")
        .seed(42)
        .with_store(store)
        .with_clock(FixedClock::new(now()))
        .build()
        .unwrap()
}

/// Memory store whose saves can be switched to fail.
struct FlakyStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

impl PlayerStore for FlakyStore {
    fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<PlayerSnapshot, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.save(key, snapshot)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }
}

fn flaky_session(player: PlayerSnapshot) -> (JourneySession, Arc<AtomicBool>) {
    let failing = Arc::new(AtomicBool::new(false));
    let store = FlakyStore {
        inner: MemoryStore::with_player("tester", player),
        failing: failing.clone(),
    };
    (session_with(store), failing)
}

#[test]
fn ferry_toll_walkthrough() {
    let mut session = session_with(MemoryStore::with_player("tester", make_player(4, 100)));

    let moved = session.move_player().unwrap();
    assert_eq!(moved.player.position, 5);
    let encounter = moved.encounter.unwrap();
    assert_eq!(encounter.info.id.as_str(), "OBJ01");
    assert_eq!(encounter.info.topic, "travel");
    let node = moved.next_node.unwrap();
    assert_eq!(node.id.as_str(), "D1");
    assert_eq!(node.options.len(), 2);

    let paid = session.choose_option("D1", "O1").unwrap();
    let player = paid.player.unwrap();
    assert_eq!(player.gold, 90);
    assert!(player.has_item("ticket"));
    assert!(!paid.dialogue_complete);
    assert_eq!(paid.next_node.unwrap().id.as_str(), "D2");
    assert_eq!(
        paid.applied.unwrap().to_string(),
        "Changes: -10 gold, +1 items"
    );
    assert!(matches!(
        session.state(),
        SessionState::AwaitingChoice(active) if active.node.as_str() == "D2"
    ));
}

#[test]
fn gained_item_unlocks_gated_options() {
    let mut session = session_with(MemoryStore::with_player("tester", make_player(4, 100)));
    session.move_player().unwrap();
    session.choose_option("D1", "O1").unwrap();

    let took = session.choose_option("D2", "take").unwrap();
    let d3 = took.next_node.unwrap();
    assert!(d3.option("light").is_some());
    assert!(took.player.unwrap().flag("crossed"));

    let lit = session.choose_option("D3", "light").unwrap();
    assert!(lit.dialogue_complete);
    assert_eq!(lit.player.unwrap().cristal, 1);

    // The ferry gossip step event is the only eligible one at position 6.
    let gossip = session.move_player().unwrap();
    assert_eq!(gossip.step_event.unwrap().id.as_str(), "E_AFTER_FERRY");
    assert_eq!(gossip.next_node.unwrap().id.as_str(), "G1");

    // G2 has no options, so only the acknowledge fallback is offered.
    let g2 = session.choose_option("G1", "yes").unwrap().next_node.unwrap();
    assert_eq!(g2.options.len(), 1);
    assert_eq!(g2.options[0].id, ACKNOWLEDGE_OPTION_ID);
    assert!(session
        .choose_option("G2", ACKNOWLEDGE_OPTION_ID)
        .unwrap()
        .dialogue_complete);

    assert!(session.move_player().unwrap().next_node.is_none());
    let cave = session.move_player().unwrap().next_node.unwrap();
    assert_eq!(cave.id.as_str(), "CAVE1");
    assert!(cave.option("enter").is_some());
    let entered = session.choose_option("CAVE1", "enter").unwrap();
    assert_eq!(entered.player.unwrap().gold, 140);
}

#[test]
fn gated_option_hidden_without_item() {
    let mut session = session_with(MemoryStore::with_player("tester", make_player(7, 100)));
    let cave = session.move_player().unwrap().next_node.unwrap();
    assert_eq!(cave.id.as_str(), "CAVE1");
    assert!(cave.option("enter").is_none());
    assert_eq!(cave.options[0].id, ACKNOWLEDGE_OPTION_ID);

    let err = session.choose_option("CAVE1", "enter").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Rejected(Rejection::MissingItem { .. })
    ));
    assert_eq!(session.player().unwrap().gold, 100);
}

#[test]
fn encounter_fires_only_once() {
    let mut session = session_with(MemoryStore::with_player("tester", make_player(4, 100)));
    assert!(session.move_player().unwrap().encounter.is_some());
    session.choose_option("D1", "O2").unwrap();

    let store = MemoryStore::with_player("tester", make_player(4, 100));
    let mut replay = session_with(store);
    replay.restore_pool(&session.pool_state());
    let again = replay.move_player().unwrap();
    assert!(again.encounter.is_none());
    assert!(replay
        .track()
        .encounters
        .iter()
        .all(|m| m.info.id.as_str() != "OBJ01"));
}

#[test]
fn end_of_track_rejects_move() {
    let mut session = JourneySession::builder()
        .content_file(CONTENT)
        .config_file(CONFIG)
        .player_key("tester")
        .with_store(MemoryStore::with_player("tester", make_player(20, 100)))
        .with_clock(FixedClock::new(now()))
        .build()
        .unwrap();

    let err = session.move_player().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Rejected(Rejection::EndOfTrack { position: 20 })
    ));
    assert_eq!(session.player().unwrap().position, 20);
    assert_eq!(session.state(), &SessionState::Idle);
}

#[test]
fn config_file_shapes_fresh_player() {
    let mut session = JourneySession::builder()
        .content_file(CONTENT)
        .config_file(CONFIG)
        .player_key("0123456789abcdef")
        .with_clock(FixedClock::new(now()))
        .build()
        .unwrap();

    let player = session.player().unwrap();
    assert_eq!(player.name, "Player_01234567");
    assert_eq!(player.health, 80);
    assert_eq!(player.energy, 60);
    assert_eq!(player.gold, 120);
    assert_eq!(player.cristal, 1);

    let moved = session.move_player().unwrap();
    assert_eq!(moved.player.energy, 55);
    assert_eq!(session.track().track_length, 30);
}

#[test]
fn failed_save_keeps_dialogue_open() {
    let (mut session, failing) = flaky_session(make_player(4, 100));
    session.move_player().unwrap();

    failing.store(true, Ordering::SeqCst);
    let err = session.choose_option("D1", "O1").unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Unavailable(_))));
    assert!(matches!(
        session.state(),
        SessionState::AwaitingChoice(active) if active.node.as_str() == "D1"
    ));

    failing.store(false, Ordering::SeqCst);
    assert_eq!(session.player().unwrap().gold, 100);
    let retried = session.choose_option("D1", "O1").unwrap();
    assert_eq!(retried.player.unwrap().gold, 90);
}

#[test]
fn failed_save_on_move_leaves_encounter_in_place() {
    let (mut session, failing) = flaky_session(make_player(4, 100));

    failing.store(true, Ordering::SeqCst);
    assert!(matches!(
        session.move_player().unwrap_err(),
        SessionError::Store(_)
    ));
    assert_eq!(session.state(), &SessionState::Idle);

    failing.store(false, Ordering::SeqCst);
    assert_eq!(session.player().unwrap().position, 4);
    let moved = session.move_player().unwrap();
    assert_eq!(moved.encounter.unwrap().info.id.as_str(), "OBJ01");
}

#[test]
fn purchase_rules() {
    let (mut session, failing) = flaky_session(make_player(0, 100));

    let bought = session.purchase("map").unwrap();
    assert_eq!(bought.player.gold, 60);
    assert!(bought.player.has_item("map"));
    assert_eq!(bought.applied.note, "Now you know the way.");
    assert_eq!(bought.applied.gold, -40);

    assert!(matches!(
        session.purchase("map").unwrap_err(),
        SessionError::Rejected(Rejection::ListingUnavailable(_))
    ));
    assert!(matches!(
        session.purchase("yacht").unwrap_err(),
        SessionError::Rejected(Rejection::InsufficientGold {
            needed: 5000,
            available: 60
        })
    ));
    assert!(matches!(
        session.purchase("nothing").unwrap_err(),
        SessionError::Rejected(Rejection::ListingUnavailable(_))
    ));

    failing.store(true, Ordering::SeqCst);
    assert!(session.purchase("bread").is_err());
    failing.store(false, Ordering::SeqCst);
    assert!(session.shop_listings().iter().any(|l| l.id == "bread"));
    assert_eq!(session.purchase("bread").unwrap().player.gold, 55);
}

#[test]
fn reset_restocks_shop_and_track() {
    let mut session = session_with(MemoryStore::with_player("tester", make_player(4, 100)));
    session.move_player().unwrap();
    session.purchase("bread").unwrap();
    assert_eq!(session.track().encounters.len(), 2);

    session.reset();
    assert_eq!(session.state(), &SessionState::Idle);
    assert_eq!(session.track().encounters.len(), 3);
    assert_eq!(session.shop_listings().len(), 3);

    let fresh = session.restart().unwrap();
    assert_eq!(fresh.position, 0);
    assert_eq!(fresh.name, "Player_tester");
}

#[test]
fn file_store_resumes_between_sessions() {
    let dir = tempfile::TempDir::new().unwrap();
    let saved_pool;
    {
        let mut session = session_with(FileStore::new(dir.path()).unwrap());
        session.player().unwrap();
        for _ in 0..5 {
            session.move_player().unwrap();
        }
        session.choose_option("D1", "O1").unwrap();
        saved_pool = session.pool_state();
    }

    let mut resumed = session_with(FileStore::new(dir.path()).unwrap());
    resumed.restore_pool(&saved_pool);
    let player = resumed.player().unwrap();
    assert_eq!(player.position, 5);
    assert_eq!(player.gold, 90);
    assert!(player.has_item("ticket"));
    assert_eq!(resumed.track().encounters.len(), 2);
}

#[test]
fn offline_regeneration_is_persisted() {
    let clock = Arc::new(FixedClock::new(now()));
    let store = Arc::new(MemoryStore::with_player(
        "tester",
        PlayerSnapshot {
            energy: 0,
            ..make_player(3, 10)
        },
    ));
    let session = JourneySession::builder()
        .content_file(CONTENT)
        .player_key("tester")
        .with_store(SharedStore(store.clone()))
        .with_clock(clock.clone())
        .build()
        .unwrap();

    clock.advance(Duration::hours(4) + Duration::minutes(30));
    assert_eq!(session.player().unwrap().energy, 40);

    let stored = store.load("tester").unwrap().unwrap();
    assert_eq!(stored.energy, 40);
    assert_eq!(stored.updated_at, now() + Duration::hours(4) + Duration::minutes(30));
}

struct SharedStore(Arc<MemoryStore>);

impl PlayerStore for SharedStore {
    fn load(&self, key: &str) -> Result<Option<PlayerSnapshot>, StoreError> {
        self.0.load(key)
    }

    fn save(&self, key: &str, snapshot: &PlayerSnapshot) -> Result<PlayerSnapshot, StoreError> {
        self.0.save(key, snapshot)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.0.delete(key)
    }
}

#[test]
fn merged_content_overrides_by_id() {
    let mut content = ContentTables::load_from_ron(Path::new(CONTENT)).unwrap();
    content.merge(ContentTables::load_from_ron(Path::new("tests/fixtures/override_content.ron")).unwrap());

    let mut session = JourneySession::builder()
        .with_content(content)
        .with_config(EngineConfig::default())
        .player_key("tester")
        .with_store(MemoryStore::with_player("tester", make_player(4, 100)))
        .with_clock(FixedClock::new(now()))
        .build()
        .unwrap();

    let node = session.move_player().unwrap().next_node.unwrap();
    assert_eq!(node.text, "Prices went up. Twenty gold.");
    assert_eq!(session.choose_option("D1", "O1").unwrap().player.unwrap().gold, 80);
    assert_eq!(session.purchase("bread").unwrap().listing.title, "Stale bread");
}
