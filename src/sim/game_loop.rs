//! Game Loop (§4.3): advances one game state to a chosen `currentTime`.
//! Structured after the donor's `run_game_loop` shape in
//! `games/lexi_wars/engine.rs` (a linear advance-then-dispatch body), but
//! driven by an explicit `currentTime` argument rather than an internal
//! `tokio::select!` sleep, since suspension belongs to the caller (§5).

use crate::config::{DifficultyTable, GameConstants};
use crate::model::end_result::EndResult;
use crate::model::event::ScheduledEvent;
use crate::model::game_record::GameStatus;
use crate::model::game_state::GameState;
use crate::model::ids::ArmadaId;
use crate::sim::{ai, battle};
use tracing::warn;

/// Advances `state` in place to `current_time` (or a computed default when
/// `None`), per the five steps of §4.3. Returns the time the state was
/// advanced to.
pub fn process_game_state(
    state: &mut GameState,
    current_time: Option<i64>,
    now_ms: i64,
    constants: &GameConstants,
    difficulty_table: &DifficultyTable,
) -> i64 {
    let current_time = current_time.unwrap_or_else(|| {
        (state.last_update_time + constants.event_processing_time_buffer_ms).max(now_ms)
    });

    process_arrived_armadas(state, current_time, constants);
    drain_scheduled_events(state, current_time, constants);

    if state.status != GameStatus::Completed {
        ai::process_ai_turns(state, current_time, difficulty_table, constants);
    }

    state.last_update_time = current_time;
    current_time
}

fn process_arrived_armadas(state: &mut GameState, current_time: i64, constants: &GameConstants) {
    let arrived: Vec<ArmadaId> = state
        .armadas
        .iter()
        .filter_map(|armada| {
            if armada.departure_time > current_time {
                warn!(
                    armada_id = %armada.id,
                    departure_time = armada.departure_time,
                    current_time,
                    "armada departure time is in the future; clock skew, skipping"
                );
                return None;
            }
            if current_time - armada.departure_time < constants.min_armada_travel_time_ms {
                return None;
            }
            if armada.arrival_time <= current_time {
                Some(armada.id.clone())
            } else {
                None
            }
        })
        .collect();

    for armada_id in arrived {
        battle::handle_armada_arrival(state, &armada_id);
        check_game_end(state, current_time);
        if state.status == GameStatus::Completed {
            break;
        }
    }
}

fn drain_scheduled_events(state: &mut GameState, current_time: i64, constants: &GameConstants) {
    while state.event_queue.peek_due(current_time) {
        let Some(event) = state.event_queue.pop() else {
            break;
        };
        match event {
            ScheduledEvent::ResourceTick { .. } => resource_tick(state, current_time, constants),
            ScheduledEvent::GameEnd { .. } => game_end(state, current_time),
            ScheduledEvent::ArmadaArrival { .. } => {
                warn!("legacy armada_arrival event dropped; armadas are authoritative");
            }
        }
        if state.status == GameStatus::Completed {
            break;
        }
    }
}

/// §4.3.1.
fn resource_tick(state: &mut GameState, current_time: i64, constants: &GameConstants) {
    let eliminated = state.eliminated_players.clone();
    let slots: Vec<_> = state
        .players
        .iter()
        .map(|p| p.slot_index)
        .filter(|slot| !eliminated.contains(slot))
        .collect();

    for slot in slots {
        let total_volume: f64 = state.planets_owned_by(slot).map(|p| p.volume).sum();
        let delta = total_volume * state.production_rate / constants.resource_updates_per_min;
        *state.player_resources.entry(slot).or_insert(0.0) += delta;
    }

    let sequence = state.next_event_sequence();
    state.event_queue.push(
        ScheduledEvent::ResourceTick {
            scheduled_time: current_time + constants.resource_tick_interval_ms,
        },
        sequence,
    );
}

/// §4.3.2.
fn game_end(state: &mut GameState, _current_time: i64) {
    if state.status == GameStatus::Completed {
        return;
    }
    finalize_game_end(state);
}

fn check_game_end(state: &mut GameState, _current_time: i64) {
    if state.status == GameStatus::Completed {
        return;
    }
    let present_slots: Vec<_> = state
        .players
        .iter()
        .map(|p| p.slot_index)
        .filter(|slot| state.has_presence(*slot))
        .collect();
    if present_slots.len() <= 1 {
        finalize_game_end(state);
    }
}

fn finalize_game_end(state: &mut GameState) {
    let present_slots: Vec<_> = state
        .players
        .iter()
        .map(|p| p.slot_index)
        .filter(|slot| state.has_presence(*slot))
        .collect();

    state.end_result = match present_slots.as_slice() {
        [] => EndResult::DrawnGame,
        [only] => {
            let name = state
                .players
                .iter()
                .find(|p| p.slot_index == *only)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            EndResult::Player {
                winner_slot: *only,
                name,
            }
        }
        _ => EndResult::DrawnGame,
    };
    state.status = GameStatus::Completed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::EventQueue;
    use crate::model::game_record::Player;
    use crate::model::game_state::{Armada, Planet, Position};
    use crate::model::ids::{PlanetId, PlayerSlot};
    use crate::sim::rng::RngState;
    use std::collections::{BTreeMap, BTreeSet};

    fn base_state() -> GameState {
        GameState {
            status: GameStatus::Active,
            start_time: 0,
            duration_minutes: 30,
            last_update_time: 0,
            players: vec![Player {
                slot_index: PlayerSlot(1),
                name: "One".into(),
                is_ai: false,
                difficulty: None,
                color: "red".into(),
            }],
            planets: vec![
                Planet {
                    id: PlanetId(1),
                    owner_slot: Some(PlayerSlot(1)),
                    volume: 10.0,
                    ships: 5,
                    position: Position { x: 0.0, y: 0.0 },
                },
                Planet {
                    id: PlanetId(2),
                    owner_slot: Some(PlayerSlot(1)),
                    volume: 20.0,
                    ships: 3,
                    position: Position { x: 1.0, y: 1.0 },
                },
            ],
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
            rng_seed: 1,
            rng_state: RngState::from_seed(1),
            end_result: EndResult::None,
            production_rate: 1.0,
            armada_speed: 1.0,
            neutral_planet_count: 0,
        }
    }

    // Scenario 5: resource tick.
    #[test]
    fn resource_tick_credits_exact_amount_and_reschedules() {
        let mut state = base_state();
        let constants = GameConstants {
            resource_updates_per_min: 6.0,
            ..GameConstants::default()
        };
        let sequence = state.next_event_sequence();
        state.event_queue.push(
            ScheduledEvent::ResourceTick { scheduled_time: 1_000 },
            sequence,
        );

        let table = DifficultyTable::default();
        process_game_state(&mut state, Some(1_000), 1_000, &constants, &table);

        assert_eq!(state.player_resources[&PlayerSlot(1)], 5.0);
        assert!(state.event_queue.peek_due(1_000 + constants.resource_tick_interval_ms));
        assert!(!state.event_queue.peek_due(1_000 + constants.resource_tick_interval_ms - 1));
    }

    #[test]
    fn armada_is_skipped_just_below_min_travel_time() {
        let mut state = base_state();
        let constants = GameConstants::default();
        let table = DifficultyTable::default();
        state.armadas.push(Armada {
            id: ArmadaId::new(),
            owner_slot: PlayerSlot(1),
            ships: 2,
            source_planet_id: PlanetId(1),
            destination_planet_id: PlanetId(2),
            departure_time: 0,
            arrival_time: 0,
        });
        let current_time = constants.min_armada_travel_time_ms - 1;
        process_game_state(&mut state, Some(current_time), current_time, &constants, &table);
        assert_eq!(state.armadas.len(), 1, "armada should not have arrived yet");
    }

    #[test]
    fn armada_arrives_exactly_at_arrival_time() {
        let mut state = base_state();
        let constants = GameConstants::default();
        let table = DifficultyTable::default();
        let arrival = constants.min_armada_travel_time_ms + 10;
        state.armadas.push(Armada {
            id: ArmadaId::new(),
            owner_slot: PlayerSlot(1),
            ships: 2,
            source_planet_id: PlanetId(1),
            destination_planet_id: PlanetId(2),
            departure_time: 0,
            arrival_time: arrival,
        });
        process_game_state(&mut state, Some(arrival), arrival, &constants, &table);
        assert!(state.armadas.is_empty());
    }

    #[test]
    fn lone_surviving_player_ends_the_game() {
        let mut state = base_state();
        let constants = GameConstants::default();
        let table = DifficultyTable::default();
        process_game_state(&mut state, Some(100), 100, &constants, &table);
        assert_eq!(state.status, GameStatus::Active, "single player with presence but no opponents yet is not auto-ended by a tick with no events");
    }
}
