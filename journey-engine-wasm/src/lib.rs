//! WASM bindings for journey-engine — runs the whole game client-side.
//!
//! Every method takes and returns JSON strings so the browser side never
//! needs to know the Rust types.

use chrono::{DateTime, Utc};
use wasm_bindgen::prelude::*;

use journey_engine::core::content::ContentTables;
use journey_engine::core::pool::PoolState;
use journey_engine::core::session::{JourneySession, SessionError};
use journey_engine::schema::player::PlayerSnapshot;

// ---------------------------------------------------------------------------
// Embedded content — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const COASTAL_ROAD: &str = include_str!("../../content_data/coastal_road/content.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize, serde::Deserialize)]
struct SaveGame {
    player: PlayerSnapshot,
    #[serde(default)]
    pool: PoolState,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// Rejections are an expected part of play, so they come back as data
/// instead of thrown errors.
#[derive(serde::Serialize)]
struct Rejected {
    rejected: String,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn respond<T: serde::Serialize>(result: Result<T, SessionError>) -> Result<String, JsError> {
    match result {
        Ok(value) => to_json(&value),
        Err(SessionError::Rejected(reason)) => to_json(&Rejected {
            rejected: reason.to_string(),
        }),
        Err(e) => Err(JsError::new(&format!("Session error: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// WASM API
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct JourneyGame {
    session: JourneySession,
}

#[wasm_bindgen]
impl JourneyGame {
    /// Create a game on the embedded Coastal Road pack.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<JourneyGame, JsError> {
        let content = ContentTables::parse_ron(data::COASTAL_ROAD)
            .map_err(|e| JsError::new(&format!("Content parse error: {e}")))?;

        let session = JourneySession::builder()
            .with_content(content)
            .player_key("browser")
            .seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Session build error: {e}")))?;

        Ok(JourneyGame { session })
    }

    /// Take one step. Returns the move outcome, or `{"rejected": ...}`.
    pub fn move_player(&mut self) -> Result<String, JsError> {
        respond(self.session.move_player())
    }

    pub fn choose_option(&mut self, node_id: &str, option_id: &str) -> Result<String, JsError> {
        respond(self.session.choose_option(node_id, option_id))
    }

    pub fn purchase(&mut self, listing_id: &str) -> Result<String, JsError> {
        respond(self.session.purchase(listing_id))
    }

    pub fn player(&self) -> Result<String, JsError> {
        respond(self.session.player())
    }

    pub fn track(&self) -> Result<String, JsError> {
        to_json(&self.session.track())
    }

    /// Listings still for sale as a JSON array.
    pub fn shop(&self) -> Result<String, JsError> {
        to_json(&self.session.shop_listings())
    }

    /// Player and consumed events as one JSON document for local storage.
    pub fn export_save(&self) -> Result<String, JsError> {
        let player = self
            .session
            .player()
            .map_err(|e| JsError::new(&format!("Session error: {e}")))?;
        to_json(&SaveGame {
            player,
            pool: self.session.pool_state(),
            saved_at: Some(Utc::now()),
        })
    }

    pub fn import_save(&mut self, save_json: &str) -> Result<(), JsError> {
        let save: SaveGame = serde_json::from_str(save_json)
            .map_err(|e| JsError::new(&format!("Invalid save JSON: {e}")))?;
        self.session
            .import_player(&save.player)
            .map_err(|e| JsError::new(&format!("Session error: {e}")))?;
        self.session.restore_pool(&save.pool);
        Ok(())
    }

    /// Restock events and the shop. With `restart`, also start a new player.
    pub fn reset(&mut self, restart: bool) -> Result<(), JsError> {
        if restart {
            self.session
                .restart()
                .map_err(|e| JsError::new(&format!("Session error: {e}")))?;
        } else {
            self.session.reset();
        }
        Ok(())
    }
}
