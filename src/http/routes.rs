//! Admin HTTP surface: a minimal, read-only `axum::Router` for operational
//! visibility. Not a player-facing API (join/leave/config wizard live in a
//! separate collaborator), but ambient engineering concerns — health checks
//! and an admin index — are carried regardless, per the donor's own
//! `http::create_http_routes(state)` composition style.

use crate::errors::AppError;
use crate::model::game_record::{GameRecord, GameStatus};
use crate::store::game_store::GameStore;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AdminState {
    pub game_store: Arc<GameStore>,
}

pub fn create_admin_routes(state: AdminState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/admin/games", get(list_games))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ListGamesQuery {
    status: Option<String>,
}

async fn list_games(
    State(state): State<AdminState>,
    Query(query): Query<ListGamesQuery>,
) -> Result<Json<Vec<GameRecord>>, (axum::http::StatusCode, String)> {
    let status = match query.status.as_deref() {
        None => None,
        Some("PENDING") => Some(GameStatus::Pending),
        Some("ACTIVE") => Some(GameStatus::Active),
        Some("COMPLETED") => Some(GameStatus::Completed),
        Some(other) => {
            return Err((
                axum::http::StatusCode::BAD_REQUEST,
                format!("unknown status filter: {other}"),
            ))
        }
    };

    state
        .game_store
        .list_games(status)
        .await
        .map(Json)
        .map_err(|e| AppError::from(e).to_response())
}
