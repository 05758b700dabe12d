pub mod ai;
pub mod battle;
pub mod game_loop;
pub mod rng;
