use crate::model::ids::PlayerSlot;
use serde::{Deserialize, Serialize};

/// Three-way sum type for a finished game's outcome (§3.3, §9 "endResult
/// variant"). Equality is by slot id for `Winner`, by identity for `Drawn`,
/// and `None` never equals anything but itself — implemented as a single
/// total `PartialEq` rather than ad-hoc string comparisons after decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EndResult {
    #[serde(rename = "null")]
    None,
    DrawnGame,
    Player { winner_slot: PlayerSlot, name: String },
}

impl EndResult {
    pub fn is_decided(&self) -> bool {
        !matches!(self, EndResult::None)
    }
}

impl PartialEq for EndResult {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EndResult::None, EndResult::None) => true,
            (EndResult::DrawnGame, EndResult::DrawnGame) => true,
            (EndResult::Player { winner_slot: a, .. }, EndResult::Player { winner_slot: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_total_and_by_slot_for_player() {
        let a = EndResult::Player {
            winner_slot: PlayerSlot(1),
            name: "Alice".into(),
        };
        let b = EndResult::Player {
            winner_slot: PlayerSlot(1),
            name: "Someone else's cached name".into(),
        };
        // name differs but slot agrees; per §9 equality is by slot id only.
        assert_eq!(a, a.clone());
        assert_eq!(a, b);
        assert_ne!(EndResult::None, EndResult::DrawnGame);
        assert_eq!(EndResult::DrawnGame, EndResult::DrawnGame);
    }
}
