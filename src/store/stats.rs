//! Stats Service: append-only daily counters (§4.1 "records a game-completion
//! stat"). Grounded on the donor's `db/lobby_state/update.rs::increment_participants`
//! atomic-HINCRBY idiom, retargeted at a per-day hash instead of a per-lobby one.

use crate::kv::KvStore;
use crate::store::keys::Keys;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

pub struct StatsService {
    kv: Arc<dyn KvStore>,
}

impl StatsService {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Best-effort: a failure to record a stat must never fail the caller's
    /// save (§4.1 "all cache writes tolerate failure").
    pub async fn record_game_completed(&self, now_ms: i64) {
        let day = day_key(now_ms);
        let key = Keys::stats(&day);
        if let Err(e) = self.kv.hash_increment(&key, "games_completed", 1).await {
            warn!(key, error = %e, "failed to record completion stat");
        }
    }
}

fn day_key(now_ms: i64) -> String {
    let dt = chrono::DateTime::from_timestamp_millis(now_ms).unwrap_or_else(|| Utc::now());
    dt.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_key_formats_as_yyyy_mm_dd() {
        // 2024-01-15T00:00:00Z
        let ms = 1_705_276_800_000;
        assert_eq!(day_key(ms), "2024-01-15");
    }
}
