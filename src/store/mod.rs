pub mod cache;
pub mod game_store;
pub mod keys;
pub mod stats;
