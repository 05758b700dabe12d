use crate::model::ids::{ArmadaId, PlanetId, PlayerSlot};
use serde::{Deserialize, Serialize};

/// Emitted when an armada reinforces a planet its owner already controls
/// (§4.4 reinforcement branch).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementEvent {
    pub planet_id: PlanetId,
    pub ships: u32,
    pub owner_slot: PlayerSlot,
}

/// One round of a resolved combat, sufficient for a client to reconstruct the
/// round-by-round animation (§4.4.1, glossary "Battle replay").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRound {
    pub attacker_roll: u32,
    pub defender_roll: u32,
    pub attacker_losses: u32,
    pub defender_losses: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleReplay {
    pub armada_id: ArmadaId,
    pub planet_id: PlanetId,
    pub attacker_slot: PlayerSlot,
    pub defender_slot: Option<PlayerSlot>,
    pub attacker_start: u32,
    pub defender_start: u32,
    pub rounds: Vec<BattleRound>,
    pub attacker_survivors: u32,
    pub defender_survivors: u32,
    pub conquered: bool,
}

/// Emitted when a planet changes ownership after a successful attack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConquestEvent {
    pub planet_id: PlanetId,
    pub previous_owner_slot: Option<PlayerSlot>,
    pub new_owner_slot: PlayerSlot,
    pub surviving_ships: u32,
}

/// Emitted when a player is marked eliminated (owns no planets, no armadas
/// in flight).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEliminationEvent {
    pub slot: PlayerSlot,
}
