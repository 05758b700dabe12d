//! Notifier Client (§4.7): fire-and-forget POSTs to the external broadcast
//! collaborator. Grounded on the donor's `reqwest::get`/`.json()` external-API
//! idiom (`http/handlers/token_info.rs`), but failure-tolerant in both
//! directions: this crate never lets a broadcast failure propagate back into
//! the tick loop (§5, §7).

use crate::model::game_record::Player;
use crate::model::game_state::GameState;
use crate::model::ids::GameId;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotifyMessage<'a> {
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        game_id: &'a GameId,
        game_state: &'a GameState,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        game_id: &'a GameId,
        player: &'a Player,
    },
    #[serde(rename_all = "camelCase")]
    GameStarted {
        game_id: &'a GameId,
        game_state: &'a GameState,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    game_id: &'a GameId,
    message: &'a NotifyMessage<'a>,
}

pub struct NotifierClient {
    client: Client,
    base_url: String,
}

impl NotifierClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout never fails to build");
        Self { client, base_url }
    }

    /// Sent by the Event Processor after every successful save that produced
    /// visible changes (§4.6). Never invoked for PENDING→ACTIVE transitions —
    /// that's `notify_game_started`'s job, owned by an external initializer.
    pub async fn notify_game_update(&self, game_id: &GameId, game_state: &GameState) {
        self.send(&NotifyMessage::GameUpdate { game_id, game_state }).await;
    }

    /// Exposed for the join-handler collaborator; never called internally by
    /// the tick loop (§9.3).
    pub async fn notify_player_joined(&self, game_id: &GameId, player: &Player) {
        self.send(&NotifyMessage::PlayerJoined { game_id, player }).await;
    }

    /// Exposed for the PENDING→ACTIVE initializer collaborator; never called
    /// internally by the tick loop (§9.3).
    pub async fn notify_game_started(&self, game_id: &GameId, game_state: &GameState) {
        self.send(&NotifyMessage::GameStarted { game_id, game_state }).await;
    }

    async fn send(&self, message: &NotifyMessage<'_>) {
        let game_id = match message {
            NotifyMessage::GameUpdate { game_id, .. }
            | NotifyMessage::PlayerJoined { game_id, .. }
            | NotifyMessage::GameStarted { game_id, .. } => *game_id,
        };
        let envelope = Envelope { game_id, message };
        let url = format!("{}/notify", self.base_url);

        let result = self.client.post(&url).json(&envelope).send().await;
        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                warn!(status = %resp.status(), url, "notifier responded with a non-success status");
            }
            Err(e) => {
                warn!(error = %e, url, "failed to reach notifier");
            }
        }
    }
}
