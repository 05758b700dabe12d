use axum::http::StatusCode;
use redis::RedisError;
use thiserror::Error;

/// Errors raised by the KV/Game Store boundary (§4.1, §7 of the design doc).
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("game not found")]
    NotFound,

    #[error("version conflict: actual version is {actual}")]
    VersionConflict { actual: String },

    #[error("storage I/O failure: {0}")]
    Io(String),
}

/// Rejections returned by Game Store slot operations (`addPlayerToGame`,
/// `removePlayerFromGame`, `canGameStart`). These are not exceptions: callers
/// inspect the `Result` and surface the rejection, never an unwind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameRejection {
    #[error("game is not accepting new players")]
    NotPending,

    #[error("no open slot available")]
    NoOpenSlot,

    #[error("slot {0} is not occupied")]
    SlotNotOccupied(u8),

    #[error("not enough players to start: need {required}, have {actual}")]
    InsufficientPlayers { required: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Redis error: {0}")]
    RedisError(String),

    #[error("Redis pool error: {0}")]
    RedisPoolError(String),

    #[error("Redis command error: {0}")]
    RedisCommandError(#[from] RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Env error: {0}")]
    EnvError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Rejected: {0}")]
    Rejected(#[from] GameRejection),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Internal server error")]
    InternalError,
}

impl AppError {
    pub fn to_response(&self) -> (StatusCode, String) {
        match self {
            AppError::RedisError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.clone()),
            AppError::RedisPoolError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.clone()),
            AppError::RedisCommandError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Serialization(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Deserialization(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::EnvError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "not found".to_string())
            }
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Rejected(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Notifier(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected server error".into(),
            ),
        }
    }
}
