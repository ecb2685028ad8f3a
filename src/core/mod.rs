pub mod clock;
pub mod conditions;
pub mod config;
pub mod content;
pub mod effects;
pub mod pool;
pub mod selector;
pub mod session;
pub mod shop;
pub mod store;
