//! Cache Coordinator (§4.2): keeps the Open/Active Games indices advisory
//! and best-effort in step with Game Store saves. Grounded on the donor's
//! `db/lobby_state/update.rs` "update side-table on status change" style,
//! generalised from a single lobby hash to the two index sets this crate
//! uses.

use crate::kv::KvStore;
use crate::model::game_record::{GameRecord, GameStatus};
use crate::store::keys::Keys;
use std::sync::Arc;
use tracing::warn;

pub struct CacheCoordinator {
    kv: Arc<dyn KvStore>,
}

impl CacheCoordinator {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Called after a successful `saveGame`. All failures here are logged
    /// and swallowed: the indices are hints, not sources of truth (§4.1).
    pub async fn on_game_saved(&self, record: &GameRecord, previous_status: Option<GameStatus>) {
        let game_id = record.game_id.as_str().to_string();

        match record.status {
            GameStatus::Pending => self.upsert(Keys::open_games(), &game_id).await,
            _ => self.remove(Keys::open_games(), &game_id).await,
        }

        match (previous_status, record.status) {
            (_, GameStatus::Active) => self.upsert(Keys::active_games(), &game_id).await,
            (Some(GameStatus::Active), _) => self.remove(Keys::active_games(), &game_id).await,
            _ => {}
        }
    }

    pub async fn on_game_deleted(&self, game_id: &str) {
        self.remove(Keys::open_games(), game_id).await;
        self.remove(Keys::active_games(), game_id).await;
    }

    async fn upsert(&self, index: &str, game_id: &str) {
        if let Err(e) = self.kv.set_add(index, game_id).await {
            warn!(index, game_id, error = %e, "failed to update index; advisory only");
        }
    }

    async fn remove(&self, index: &str, game_id: &str) {
        if let Err(e) = self.kv.set_remove(index, game_id).await {
            warn!(index, game_id, error = %e, "failed to update index; advisory only");
        }
    }
}
