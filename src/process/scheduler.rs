//! Scheduler: the outer driving loop. Grounded on the donor's
//! `tokio::spawn`-background-task idiom (`lobby/engine.rs`) for fanning work
//! out, generalised to the §5 "parallel per-game, no ordering guarantees
//! between games" model — one task per active game, aggregated with
//! `futures::future::join_all` rather than a sequential `for` loop.

use crate::config::{AppConfig, DifficultyTable, GameConstants};
use crate::model::ids::GameId;
use crate::notify::NotifierClient;
use crate::process::event_processor;
use crate::store::game_store::GameStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Processes every currently-ACTIVE game concurrently and returns the number
/// that produced a broadcast. A panic or cancellation in one game's task
/// never affects another's (§5).
pub async fn process_all_game_events(
    game_store: Arc<GameStore>,
    notifier: Arc<NotifierClient>,
    constants: GameConstants,
    difficulty_table: DifficultyTable,
) -> usize {
    let active_ids: Vec<GameId> = match game_store
        .list_games(Some(crate::model::game_record::GameStatus::Active))
        .await
    {
        Ok(records) => records.into_iter().map(|r| r.game_id).collect(),
        Err(e) => {
            error!(error = %e, "failed to list active games for this tick");
            return 0;
        }
    };

    let tasks: Vec<_> = active_ids
        .into_iter()
        .map(|game_id| {
            let game_store = game_store.clone();
            let notifier = notifier.clone();
            let constants = constants;
            let difficulty_table = difficulty_table;
            tokio::spawn(async move {
                event_processor::process_game_events(
                    &game_id,
                    &game_store,
                    &notifier,
                    &constants,
                    &difficulty_table,
                )
                .await
            })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    results
        .into_iter()
        .filter(|r| matches!(r, Ok(true)))
        .count()
}

/// Runs `process_all_game_events` on a fixed interval until the process
/// exits. Intended to be spawned once at startup (`main.rs`).
pub async fn run(
    game_store: Arc<GameStore>,
    notifier: Arc<NotifierClient>,
    config: AppConfig,
) -> ! {
    let mut interval = tokio::time::interval(Duration::from_millis(config.scheduler_tick_interval_ms));
    loop {
        interval.tick().await;
        let broadcast_count = process_all_game_events(
            game_store.clone(),
            notifier.clone(),
            config.constants,
            config.difficulty,
        )
        .await;
        if broadcast_count > 0 {
            info!(broadcast_count, "scheduler tick processed active games");
        }
    }
}
