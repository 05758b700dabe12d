//! Event Processor (§4.6): the per-game unit of work. Grounded on the
//! donor's `games/lexi_wars/engine.rs` load→mutate→persist→broadcast loop
//! shape, with the version-conflict retry and save-before-broadcast fence
//! this crate's optimistic locking requires that the donor's single-writer
//! lobby state never needed.

use crate::config::{DifficultyTable, GameConstants};
use crate::model::end_result::EndResult;
use crate::model::game_record::GameStatus;
use crate::model::game_state::GameState;
use crate::model::ids::GameId;
use crate::notify::NotifierClient;
use crate::sim::game_loop;
use crate::store::game_store::GameStore;
use chrono::Utc;
use tracing::{info, warn};

const MAX_RETRIES: u32 = 2;

struct Snapshot {
    status: GameStatus,
    end_result: EndResult,
    last_update_time: i64,
    armada_count: usize,
    ephemeral_count: usize,
}

impl Snapshot {
    fn of(state: &GameState) -> Self {
        Self {
            status: state.status,
            end_result: state.end_result.clone(),
            last_update_time: state.last_update_time,
            armada_count: state.armadas.len(),
            ephemeral_count: state.recent_battle_replays.len()
                + state.recent_reinforcement_events.len()
                + state.recent_conquest_events.len()
                + state.recent_player_elimination_events.len(),
        }
    }

    fn differs_from(&self, other: &Snapshot) -> bool {
        self.status != other.status
            || self.end_result != other.end_result
            || self.last_update_time != other.last_update_time
            || self.armada_count != other.armada_count
            || self.ephemeral_count > other.ephemeral_count
    }
}

/// Runs one tick of simulation for `game_id` and broadcasts if anything
/// changed. Returns `true` iff a broadcast was sent.
pub async fn process_game_events(
    game_id: &GameId,
    game_store: &GameStore,
    notifier: &NotifierClient,
    constants: &GameConstants,
    difficulty_table: &DifficultyTable,
) -> bool {
    for _attempt in 0..=MAX_RETRIES {
        let Ok(Some(mut record)) = game_store.load_game(game_id).await else {
            return false;
        };
        if record.status != GameStatus::Active {
            return false;
        }
        let expected_last_update_at = record.last_update_at;

        let Some(state) = record.game_state.as_mut() else {
            return false;
        };

        let before = Snapshot::of(state);
        let now_ms = Utc::now().timestamp_millis();
        game_loop::process_game_state(state, None, now_ms, constants, difficulty_table);
        let after = Snapshot::of(state);

        if !before.differs_from(&after) {
            return false;
        }

        let broadcast_state = state.clone();
        state.clear_ephemeral_buffers();

        match game_store
            .save_game(&mut record, Some(expected_last_update_at), now_ms)
            .await
        {
            Ok(()) => {
                notifier.notify_game_update(game_id, &broadcast_state).await;
                return true;
            }
            Err(crate::errors::StoreError::VersionConflict { .. }) => {
                warn!(%game_id, "version conflict while saving game tick, retrying with a fresh load");
                continue;
            }
            Err(e) => {
                warn!(%game_id, error = %e, "failed to save game tick");
                return false;
            }
        }
    }

    info!(%game_id, "dropped game tick after exhausting version-conflict retries");
    false
}
