use crate::model::end_result::EndResult;
use crate::model::event::EventQueue;
use crate::model::events_buffer::{
    BattleReplay, ConquestEvent, PlayerEliminationEvent, ReinforcementEvent,
};
use crate::model::game_record::Player;
use crate::model::ids::{ArmadaId, PlanetId, PlayerSlot};
use crate::sim::rng::RngState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    pub id: PlanetId,
    pub owner_slot: Option<PlayerSlot>,
    pub volume: f64,
    pub ships: u32,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Armada {
    pub id: ArmadaId,
    pub owner_slot: PlayerSlot,
    pub ships: u32,
    pub source_planet_id: PlanetId,
    pub destination_planet_id: PlanetId,
    pub departure_time: i64,
    pub arrival_time: i64,
}

/// In-memory model of a single match (§3.3). This is the payload stored under
/// `GameRecord::game_state` and is what the Game Loop, Battle Manager, and AI
/// Driver mutate in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub status: crate::model::game_record::GameStatus,
    pub start_time: i64,
    pub duration_minutes: u32,
    pub last_update_time: i64,
    pub players: Vec<Player>,
    pub planets: Vec<Planet>,
    pub armadas: Vec<Armada>,
    pub player_resources: BTreeMap<PlayerSlot, f64>,
    pub eliminated_players: BTreeSet<PlayerSlot>,
    pub ai_last_decision_time: BTreeMap<PlayerSlot, i64>,
    pub event_queue: EventQueue,
    /// Monotonically increasing counter used for event queue tie-breaks.
    pub event_sequence: u64,

    #[serde(default)]
    pub recent_battle_replays: Vec<BattleReplay>,
    #[serde(default)]
    pub recent_reinforcement_events: Vec<ReinforcementEvent>,
    #[serde(default)]
    pub recent_conquest_events: Vec<ConquestEvent>,
    #[serde(default)]
    pub recent_player_elimination_events: Vec<PlayerEliminationEvent>,

    pub rng_seed: u64,
    pub rng_state: RngState,
    pub end_result: EndResult,

    pub production_rate: f64,
    pub armada_speed: f64,
    pub neutral_planet_count: u32,
}

impl GameState {
    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    pub fn planet_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.planets.iter_mut().find(|p| p.id == id)
    }

    pub fn planets_owned_by(&self, slot: PlayerSlot) -> impl Iterator<Item = &Planet> {
        self.planets.iter().filter(move |p| p.owner_slot == Some(slot))
    }

    pub fn armadas_in_flight_for(&self, slot: PlayerSlot) -> usize {
        self.armadas.iter().filter(|a| a.owner_slot == slot).count()
    }

    /// A slot has "presence" if it owns at least one planet or has at least
    /// one armada in flight (used by game-end and elimination checks, §4.3.2
    /// and §4.4).
    pub fn has_presence(&self, slot: PlayerSlot) -> bool {
        self.planets_owned_by(slot).next().is_some() || self.armadas_in_flight_for(slot) > 0
    }

    pub fn next_event_sequence(&mut self) -> u64 {
        let seq = self.event_sequence;
        self.event_sequence += 1;
        seq
    }

    pub fn clear_ephemeral_buffers(&mut self) {
        self.recent_battle_replays.clear();
        self.recent_reinforcement_events.clear();
        self.recent_conquest_events.clear();
        self.recent_player_elimination_events.clear();
    }

    pub fn has_ephemeral_events(&self) -> bool {
        !self.recent_battle_replays.is_empty()
            || !self.recent_reinforcement_events.is_empty()
            || !self.recent_conquest_events.is_empty()
            || !self.recent_player_elimination_events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> GameState {
        GameState {
            status: crate::model::game_record::GameStatus::Active,
            start_time: 0,
            duration_minutes: 30,
            last_update_time: 0,
            players: Vec::new(),
            planets: vec![Planet {
                id: PlanetId(1),
                owner_slot: Some(PlayerSlot(0)),
                volume: 10.0,
                ships: 5,
                position: Position { x: 0.0, y: 0.0 },
            }],
            armadas: Vec::new(),
            player_resources: BTreeMap::new(),
            eliminated_players: BTreeSet::new(),
            ai_last_decision_time: BTreeMap::new(),
            event_queue: EventQueue::new(),
            event_sequence: 0,
            recent_battle_replays: Vec::new(),
            recent_reinforcement_events: Vec::new(),
            recent_conquest_events: Vec::new(),
            recent_player_elimination_events: Vec::new(),
            rng_seed: 42,
            rng_state: RngState::from_seed(42),
            end_result: EndResult::None,
            production_rate: 1.0,
            armada_speed: 1.0,
            neutral_planet_count: 0,
        }
    }

    #[test]
    fn presence_tracks_planets_and_armadas() {
        let state = sample_state();
        assert!(state.has_presence(PlayerSlot(0)));
        assert!(!state.has_presence(PlayerSlot(1)));
    }

    #[test]
    fn round_trips_through_json() {
        let state = sample_state();
        let json = serde_json::to_string(&state).unwrap();
        let decoded: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.planets.len(), state.planets.len());
        assert_eq!(decoded.rng_seed, state.rng_seed);
    }
}
