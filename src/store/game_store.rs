//! Game Store (§4.1): the sole persistence boundary for `GameRecord`s.
//! Grounded on the donor's `db/lobby_state` repository style (a thin struct
//! wrapping a Redis handle, one method per operation) generalised to the
//! single `GameRecord` aggregate this crate persists, plus the optimistic
//! locking the donor's lobby layer never needed.

use crate::errors::{AppError, GameRejection, StoreError};
use crate::kv::KvStore;
use crate::model::game_record::{GameRecord, GameStatus, Player};
use crate::model::ids::GameId;
use crate::store::cache::CacheCoordinator;
use crate::store::keys::Keys;
use crate::store::stats::StatsService;
use std::sync::Arc;
use tracing::warn;

pub struct GameStore {
    kv: Arc<dyn KvStore>,
    cache: CacheCoordinator,
    stats: StatsService,
}

impl GameStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            cache: CacheCoordinator::new(kv.clone()),
            stats: StatsService::new(kv.clone()),
            kv,
        }
    }

    pub async fn load_game(&self, game_id: &GameId) -> Result<Option<GameRecord>, StoreError> {
        let key = Keys::game(game_id);
        let Some(entry) = self.kv.get(&key).await? else {
            return Ok(None);
        };
        let record: GameRecord = serde_json::from_value(entry.value)
            .map_err(|e| StoreError::Io(format!("corrupt game record: {e}")))?;
        Ok(Some(record))
    }

    /// Saves `record`, failing with `VersionConflict` if `expected_last_update_at`
    /// is set and no longer matches the stored `lastUpdateAt` (§4.1). On
    /// success, sets `record.last_update_at = now_ms` before writing, and
    /// that becomes the new version token.
    pub async fn save_game(
        &self,
        record: &mut GameRecord,
        expected_last_update_at: Option<i64>,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let previous_status = self.load_game(&record.game_id).await.ok().flatten().map(|r| r.status);

        record.last_update_at = now_ms;
        let key = Keys::game(&record.game_id);
        let value = serde_json::to_value(&*record)
            .map_err(|e| StoreError::Io(format!("failed to serialize game record: {e}")))?;

        self.kv
            .put(
                &key,
                &value,
                expected_last_update_at.map(|v| v.to_string()).as_deref(),
                &now_ms.to_string(),
            )
            .await?;

        let became_completed =
            record.status == GameStatus::Completed && previous_status != Some(GameStatus::Completed);

        self.cache.on_game_saved(record, previous_status).await;
        if became_completed {
            self.stats.record_game_completed(now_ms).await;
        }

        Ok(())
    }

    pub async fn delete_game(&self, game_id: &GameId) -> Result<(), StoreError> {
        self.kv.delete(&Keys::game(game_id)).await?;
        self.cache.on_game_deleted(game_id.as_str()).await;
        Ok(())
    }

    /// Uses the Open/Active index when `status` is PENDING/ACTIVE; falls back
    /// to a full prefix scan otherwise or when the index is empty but a scan
    /// finds matches (the index may simply be cold on a fresh deployment).
    pub async fn list_games(&self, status: Option<GameStatus>) -> Result<Vec<GameRecord>, StoreError> {
        let indexed_ids = match status {
            Some(GameStatus::Pending) => Some(self.kv.set_members(Keys::open_games()).await?),
            Some(GameStatus::Active) => Some(self.kv.set_members(Keys::active_games()).await?),
            _ => None,
        };

        let records = match indexed_ids {
            Some(ids) if !ids.is_empty() => self.load_many(&ids).await?,
            _ => self.full_scan().await?,
        };

        Ok(match status {
            Some(wanted) => records.into_iter().filter(|r| r.status == wanted).collect(),
            None => records,
        })
    }

    /// Like `listGames(PENDING)`, but also prunes games that have sat open
    /// longer than `stale_timeout_ms` and returns only games with an open
    /// slot (§4.1).
    pub async fn get_open_games(
        &self,
        now_ms: i64,
        stale_timeout_ms: i64,
    ) -> Result<Vec<GameRecord>, StoreError> {
        let candidates = self.list_games(Some(GameStatus::Pending)).await?;
        let mut open = Vec::new();

        for record in candidates {
            if now_ms - record.created_at > stale_timeout_ms {
                if let Err(e) = self.delete_game(&record.game_id).await {
                    warn!(game_id = %record.game_id, error = %e, "failed to prune stale pending game");
                }
                continue;
            }
            let has_open_slot = record
                .pending_configuration
                .as_ref()
                .is_some_and(|cfg| cfg.open_slot().is_some());
            if has_open_slot {
                open.push(record);
            }
        }

        Ok(open)
    }

    pub async fn add_player_to_game(
        &self,
        game_id: &GameId,
        player: Player,
        now_ms: i64,
    ) -> Result<GameRecord, AppError> {
        let mut record = self.load_game(game_id).await?.ok_or(StoreError::NotFound)?;
        let expected = record.last_update_at;

        if record.status != GameStatus::Pending {
            return Err(GameRejection::NotPending.into());
        }
        let cfg = record
            .pending_configuration
            .as_mut()
            .ok_or(GameRejection::NotPending)?;
        let slot = cfg
            .player_slots
            .iter_mut()
            .find(|s| s.player.is_none())
            .ok_or(GameRejection::NoOpenSlot)?;
        slot.player = Some(player.clone());
        record.players.push(player);

        self.save_game(&mut record, Some(expected), now_ms).await?;
        Ok(record)
    }

    pub async fn remove_player_from_game(
        &self,
        game_id: &GameId,
        slot_index: u8,
        now_ms: i64,
    ) -> Result<GameRecord, AppError> {
        let mut record = self.load_game(game_id).await?.ok_or(StoreError::NotFound)?;
        let expected = record.last_update_at;

        if record.status != GameStatus::Pending {
            return Err(GameRejection::NotPending.into());
        }
        let cfg = record
            .pending_configuration
            .as_mut()
            .ok_or(GameRejection::NotPending)?;
        let slot = cfg
            .player_slots
            .iter_mut()
            .find(|s| s.slot_index.0 == slot_index)
            .ok_or(GameRejection::SlotNotOccupied(slot_index))?;
        if slot.player.take().is_none() {
            return Err(GameRejection::SlotNotOccupied(slot_index).into());
        }
        record.players.retain(|p| p.slot_index.0 != slot_index);

        self.save_game(&mut record, Some(expected), now_ms).await?;
        Ok(record)
    }

    /// Read-only guard: PENDING-only, requires every slot filled. Does not
    /// mutate or save; the PENDING→ACTIVE transition itself is an external
    /// initializer's responsibility (§1 non-goals).
    pub fn can_game_start(&self, record: &GameRecord) -> Result<(), GameRejection> {
        if record.status != GameStatus::Pending {
            return Err(GameRejection::NotPending);
        }
        let Some(cfg) = record.pending_configuration.as_ref() else {
            return Err(GameRejection::NotPending);
        };
        let occupied = cfg.occupied_count();
        let required = cfg.player_slots.len();
        if occupied < required {
            return Err(GameRejection::InsufficientPlayers {
                required,
                actual: occupied,
            });
        }
        Ok(())
    }

    async fn load_many(&self, game_ids: &[String]) -> Result<Vec<GameRecord>, StoreError> {
        let mut out = Vec::with_capacity(game_ids.len());
        for id in game_ids {
            if let Some(record) = self.load_game(&GameId::from(id.as_str())).await? {
                out.push(record);
            }
        }
        Ok(out)
    }

    async fn full_scan(&self) -> Result<Vec<GameRecord>, StoreError> {
        let keys = self.kv.list_prefix("gc_game:").await?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = self.kv.get(&key).await? {
                if let Ok(record) = serde_json::from_value::<GameRecord>(entry.value) {
                    out.push(record);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvEntry;
    use crate::model::game_record::{Difficulty, PendingConfiguration, PendingSlot};
    use crate::model::ids::PlayerSlot;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryKv {
        hashes: Mutex<HashMap<String, (serde_json::Value, String)>>,
        sets: Mutex<HashMap<String, std::collections::HashSet<String>>>,
    }

    #[async_trait]
    impl KvStore for InMemoryKv {
        async fn get(&self, key: &str) -> Result<Option<KvEntry>, StoreError> {
            Ok(self
                .hashes
                .lock()
                .unwrap()
                .get(key)
                .map(|(v, ver)| KvEntry {
                    value: v.clone(),
                    version: ver.clone(),
                }))
        }

        async fn put(
            &self,
            key: &str,
            value: &serde_json::Value,
            expected_version: Option<&str>,
            new_version: &str,
        ) -> Result<(), StoreError> {
            let mut hashes = self.hashes.lock().unwrap();
            let current = hashes.get(key).map(|(_, v)| v.clone());
            match (expected_version, &current) {
                (None, Some(actual)) => {
                    return Err(StoreError::VersionConflict {
                        actual: actual.clone(),
                    })
                }
                (Some(expected), actual) => {
                    if actual.as_deref() != Some(expected) {
                        return Err(StoreError::VersionConflict {
                            actual: actual.clone().unwrap_or_default(),
                        });
                    }
                }
                (None, None) => {}
            }
            hashes.insert(key.to_string(), (value.clone(), new_version.to_string()));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.hashes.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
            Ok(self
                .hashes
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn set_add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
            self.sets
                .lock()
                .unwrap()
                .entry(set_key.to_string())
                .or_default()
                .insert(member.to_string());
            Ok(())
        }

        async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
            if let Some(set) = self.sets.lock().unwrap().get_mut(set_key) {
                set.remove(member);
            }
            Ok(())
        }

        async fn set_members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
            Ok(self
                .sets
                .lock()
                .unwrap()
                .get(set_key)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn hash_increment(
            &self,
            _key: &str,
            _field: &str,
            amount: i64,
        ) -> Result<i64, StoreError> {
            Ok(amount)
        }
    }

    fn pending_record(game_id: &str, now_ms: i64) -> GameRecord {
        let cfg = PendingConfiguration {
            player_slots: vec![
                PendingSlot {
                    slot_index: PlayerSlot(0),
                    player: None,
                },
                PendingSlot {
                    slot_index: PlayerSlot(1),
                    player: None,
                },
            ],
            max_players: 2,
            production_rate: 1.0,
            armada_speed: 1.0,
            neutral_planet_count: 2,
            duration_minutes: 30,
        };
        GameRecord::new_pending(
            GameId::from(game_id),
            crate::model::game_record::GameType::Multiplayer,
            cfg,
            now_ms,
        )
    }

    fn store() -> GameStore {
        GameStore::new(Arc::new(InMemoryKv::default()))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = store();
        let mut record = pending_record("g1", 1_000);
        store.save_game(&mut record, None, 1_000).await.unwrap();

        let loaded = store.load_game(&record.game_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, GameStatus::Pending);
        assert_eq!(loaded.last_update_at, 1_000);
    }

    // Scenario 6: concurrent saves, one must fail with a version conflict.
    #[tokio::test]
    async fn stale_expected_version_is_rejected() {
        let store = store();
        let mut record = pending_record("g1", 1_000);
        store.save_game(&mut record, None, 1_000).await.unwrap();

        let mut first_writer = record.clone();
        let mut second_writer = record.clone();

        store
            .save_game(&mut first_writer, Some(1_000), 2_000)
            .await
            .unwrap();

        let result = store.save_game(&mut second_writer, Some(1_000), 2_500).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn add_player_fills_open_slot() {
        let store = store();
        let mut record = pending_record("g1", 1_000);
        store.save_game(&mut record, None, 1_000).await.unwrap();

        let player = Player {
            slot_index: PlayerSlot(0),
            name: "Alice".into(),
            is_ai: false,
            difficulty: None,
            color: "red".into(),
        };
        let updated = store
            .add_player_to_game(&record.game_id, player, 1_500)
            .await
            .unwrap();
        assert_eq!(updated.players.len(), 1);
        assert_eq!(
            updated
                .pending_configuration
                .unwrap()
                .occupied_count(),
            1
        );
    }

    #[tokio::test]
    async fn add_player_rejects_when_no_open_slot() {
        let store = store();
        let mut record = pending_record("g1", 1_000);
        store.save_game(&mut record, None, 1_000).await.unwrap();

        for i in 0..2 {
            let player = Player {
                slot_index: PlayerSlot(i),
                name: format!("P{i}"),
                is_ai: i == 1,
                difficulty: if i == 1 { Some(Difficulty::Easy) } else { None },
                color: "red".into(),
            };
            store
                .add_player_to_game(&record.game_id, player, 1_000 + i as i64)
                .await
                .unwrap();
        }

        let player = Player {
            slot_index: PlayerSlot(2),
            name: "Overflow".into(),
            is_ai: false,
            difficulty: None,
            color: "blue".into(),
        };
        let result = store.add_player_to_game(&record.game_id, player, 2_000).await;
        assert!(matches!(result, Err(AppError::Rejected(GameRejection::NoOpenSlot))));
    }

    #[tokio::test]
    async fn get_open_games_prunes_stale_pending_games() {
        let store = store();
        let mut record = pending_record("g1", 0);
        store.save_game(&mut record, None, 0).await.unwrap();

        let open = store.get_open_games(10_000_000, 30 * 60 * 1000).await.unwrap();
        assert!(open.is_empty());
        assert!(store.load_game(&record.game_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn can_game_start_requires_all_slots_filled() {
        let store = store();
        let mut record = pending_record("g1", 0);
        let err = store.can_game_start(&record).unwrap_err();
        assert_eq!(
            err,
            GameRejection::InsufficientPlayers {
                required: 2,
                actual: 0
            }
        );

        record.pending_configuration.as_mut().unwrap().player_slots[0].player = Some(Player {
            slot_index: PlayerSlot(0),
            name: "Alice".into(),
            is_ai: false,
            difficulty: None,
            color: "red".into(),
        });
        record.pending_configuration.as_mut().unwrap().player_slots[1].player = Some(Player {
            slot_index: PlayerSlot(1),
            name: "Bob".into(),
            is_ai: false,
            difficulty: None,
            color: "blue".into(),
        });
        assert!(store.can_game_start(&record).is_ok());
    }
}
