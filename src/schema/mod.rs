pub mod condition;
pub mod dialogue;
pub mod effect;
pub mod event;
pub mod ids;
pub mod item;
pub mod player;
