//! Journey Engine — event and dialogue resolution for track-based
//! narrative games.
//!
//! A player walks a one-dimensional track. Each step may trigger a fixed
//! encounter or a weighted, condition-gated step event; events open
//! branching dialogues whose options change the player's stats, items,
//! and flags. Content is authored in RON and player state lives behind a
//! pluggable store.

pub mod core;
pub mod schema;

pub use crate::core::session::{JourneySession, SessionError, SessionState};
