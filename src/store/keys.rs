use crate::model::ids::GameId;

/// Redis key layout (§6.2). Kept as a dedicated builder module the way the
/// donor centralises its key naming, but reshaped around the flat,
/// `gc_`-prefixed keyspace this crate actually uses instead of the donor's
/// `lobbies:{id}:...` hierarchy.
pub struct Keys;

impl Keys {
    /// Hash holding one `GameRecord` (`value` + `version` fields, see
    /// `kv::redis_store`).
    pub fn game(game_id: &GameId) -> String {
        format!("gc_game:{}", game_id.as_str())
    }

    /// Index set of game ids currently `PENDING` with an open slot.
    pub fn open_games() -> &'static str {
        "gc_open_games"
    }

    /// Index set of game ids currently `ACTIVE`.
    pub fn active_games() -> &'static str {
        "gc_active_games"
    }

    /// Daily append-only stats counters, one hash per UTC day.
    pub fn stats(day: &str) -> String {
        format!("gc_stats:{}", day)
    }
}
