//! Battle Manager (§4.4): resolves armada-arrival combat deterministically
//! and emits the derived events. Grounded on the round-based
//! `engage`/`fight_round`/`process_victor` structure of a Kalaxia-style fleet
//! combat resolver, reshaped around the crate's pure `RngState` rather than a
//! thread-local `rand::Rng`.

use crate::model::events_buffer::{
    BattleReplay, BattleRound, ConquestEvent, PlayerEliminationEvent, ReinforcementEvent,
};
use crate::model::game_state::GameState;
use crate::model::ids::ArmadaId;
use crate::sim::rng::RngState;

const DIE_SIDES: u32 = 6;

/// Called exactly once per armada that has reached its destination (§4.4).
/// Removes the armada from `state.armadas` and resolves reinforcement or
/// battle against the destination planet.
pub fn handle_armada_arrival(state: &mut GameState, armada_id: &ArmadaId) {
    let Some(idx) = state.armadas.iter().position(|a| &a.id == armada_id) else {
        return;
    };
    let armada = state.armadas.remove(idx);

    let Some(planet) = state.planet_mut(armada.destination_planet_id) else {
        return;
    };

    if planet.owner_slot == Some(armada.owner_slot) {
        planet.ships += armada.ships;
        let event = ReinforcementEvent {
            planet_id: planet.id,
            ships: armada.ships,
            owner_slot: armada.owner_slot,
        };
        state.recent_reinforcement_events.push(event);
        return;
    }

    let defender_slot = planet.owner_slot;
    let defender_start = planet.ships;
    let attacker_start = armada.ships;

    let (attacker_survivors, defender_survivors, rounds, next_rng) =
        resolve_combat(state.rng_state, attacker_start, defender_start);
    state.rng_state = next_rng;

    let conquered = attacker_survivors > 0;

    let replay = BattleReplay {
        armada_id: armada.id.clone(),
        planet_id: armada.destination_planet_id,
        attacker_slot: armada.owner_slot,
        defender_slot,
        attacker_start,
        defender_start,
        rounds,
        attacker_survivors,
        defender_survivors,
        conquered,
    };
    state.recent_battle_replays.push(replay);

    if conquered {
        let planet = state
            .planet_mut(armada.destination_planet_id)
            .expect("planet existed above");
        let previous_owner = planet.owner_slot;
        planet.owner_slot = Some(armada.owner_slot);
        planet.ships = attacker_survivors;

        state.recent_conquest_events.push(ConquestEvent {
            planet_id: planet.id,
            previous_owner_slot: previous_owner,
            new_owner_slot: armada.owner_slot,
            surviving_ships: attacker_survivors,
        });

        if let Some(previous_slot) = previous_owner {
            if !state.has_presence(previous_slot) && !state.eliminated_players.contains(&previous_slot) {
                state.eliminated_players.insert(previous_slot);
                state
                    .recent_player_elimination_events
                    .push(PlayerEliminationEvent { slot: previous_slot });
            }
        }
    } else {
        let planet = state
            .planet_mut(armada.destination_planet_id)
            .expect("planet existed above");
        planet.ships = defender_survivors;
    }
}

/// Round-based combat: each round both sides roll a die from the PRNG,
/// highest pair compared, loser takes one casualty (ties favour defender),
/// repeat until one side reaches 0 (§4.4.1 minimal reference rule).
///
/// Bounded: casualties this call never exceed `attacker_ships + defender_ships`
/// because exactly one casualty is assigned per round and the loop stops the
/// instant either side reaches zero. Deterministic: the only source of
/// randomness is `rng` threaded explicitly through each round.
fn resolve_combat(
    mut rng: RngState,
    attacker_ships: u32,
    defender_ships: u32,
) -> (u32, u32, Vec<BattleRound>, RngState) {
    let mut attacker = attacker_ships;
    let mut defender = defender_ships;
    let mut rounds = Vec::new();

    while attacker > 0 && defender > 0 {
        let (attacker_roll, next) = rng.next_die(DIE_SIDES);
        rng = next;
        let (defender_roll, next) = rng.next_die(DIE_SIDES);
        rng = next;

        let (attacker_losses, defender_losses) = if attacker_roll > defender_roll {
            (0, 1)
        } else {
            // ties favour the defender, so the attacker loses on a tie too
            (1, 0)
        };

        attacker -= attacker_losses;
        defender -= defender_losses;

        rounds.push(BattleRound {
            attacker_roll,
            defender_roll,
            attacker_losses,
            defender_losses,
        });
    }

    (attacker, defender, rounds, rng)
}
