use crate::model::game_state::GameState;
use crate::model::ids::{GameId, PlayerSlot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameType {
    Multiplayer,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// §3.2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub slot_index: PlayerSlot,
    pub name: String,
    pub is_ai: bool,
    pub difficulty: Option<Difficulty>,
    pub color: String,
}

/// Player slots and game settings enumerated while a game waits to start
/// (§3.1, present iff status = PENDING).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfiguration {
    pub player_slots: Vec<PendingSlot>,
    pub max_players: u8,
    pub production_rate: f64,
    pub armada_speed: f64,
    pub neutral_planet_count: u32,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSlot {
    pub slot_index: PlayerSlot,
    pub player: Option<Player>,
}

impl PendingConfiguration {
    pub fn open_slot(&self) -> Option<&PendingSlot> {
        self.player_slots.iter().find(|s| s.player.is_none())
    }

    pub fn occupied_count(&self) -> usize {
        self.player_slots.iter().filter(|s| s.player.is_some()).count()
    }
}

/// Persisted unit (§3.1). `lastUpdateAt` doubles as the optimistic-lock
/// version token at the Game Store boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: GameId,
    pub status: GameStatus,
    pub game_type: GameType,
    pub players: Vec<Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<GameState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_configuration: Option<PendingConfiguration>,
    pub created_at: i64,
    pub last_update_at: i64,
}

impl GameRecord {
    /// Construct a new PENDING record. Invariant (§3.1): PENDING ⇒ `gameState`
    /// absent, `pendingConfiguration.playerSlots` non-empty.
    pub fn new_pending(
        game_id: GameId,
        game_type: GameType,
        pending_configuration: PendingConfiguration,
        now_ms: i64,
    ) -> Self {
        debug_assert!(!pending_configuration.player_slots.is_empty());
        Self {
            game_id,
            status: GameStatus::Pending,
            game_type,
            players: Vec::new(),
            game_state: None,
            pending_configuration: Some(pending_configuration),
            created_at: now_ms,
            last_update_at: now_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let cfg = PendingConfiguration {
            player_slots: vec![PendingSlot {
                slot_index: PlayerSlot(0),
                player: None,
            }],
            max_players: 4,
            production_rate: 1.0,
            armada_speed: 1.0,
            neutral_planet_count: 3,
            duration_minutes: 30,
        };
        let record = GameRecord::new_pending(
            GameId::from("g1"),
            GameType::Multiplayer,
            cfg,
            1_000,
        );
        let json = serde_json::to_string(&record).unwrap();
        let decoded: GameRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.game_id, record.game_id);
        assert_eq!(decoded.status, GameStatus::Pending);
        assert!(decoded.game_state.is_none());
        assert!(decoded.pending_configuration.is_some());
    }
}
