//! Process entry point. Grounded on the donor's `lib.rs::start_server()` /
//! `shutdown_signal()` pattern: env/tracing init up front, fail-fast pool
//! construction, then the admin router served alongside a spawned background
//! loop rather than the donor's single `axum::serve` call, since this crate's
//! real work is the tick loop, not the HTTP surface.

use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use galactic_conflict_core::config::AppConfig;
use galactic_conflict_core::http::{create_admin_routes, AdminState};
use galactic_conflict_core::kv::redis_store::RedisKvStore;
use galactic_conflict_core::notify::NotifierClient;
use galactic_conflict_core::process::scheduler;
use galactic_conflict_core::store::game_store::GameStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env().expect("failed to load configuration");

    let manager = RedisConnectionManager::new(config.redis_url.clone())
        .expect("invalid REDIS_URL");
    let redis_pool = Pool::builder()
        .max_size(config.redis_pool_max_size)
        .min_idle(Some(config.redis_pool_min_idle))
        .connection_timeout(Duration::from_secs(5))
        .build(manager)
        .await
        .expect("failed to establish Redis connection pool");

    tracing::info!("Redis connection pool established");

    let kv_store = Arc::new(RedisKvStore::new(redis_pool));
    let game_store = Arc::new(GameStore::new(kv_store));
    let notifier = Arc::new(NotifierClient::new(config.notifier_base_url.clone()));

    let scheduler_handle = tokio::spawn(scheduler::run(
        game_store.clone(),
        notifier.clone(),
        config.clone(),
    ));

    let admin_state = AdminState {
        game_store: game_store.clone(),
    };
    let app = create_admin_routes(admin_state);

    let listener = tokio::net::TcpListener::bind(&config.admin_http_addr)
        .await
        .expect("failed to bind admin HTTP address");

    tracing::info!(addr = %config.admin_http_addr, "admin HTTP surface listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "admin HTTP server error");
    }

    scheduler_handle.abort();
}

/// Handle graceful shutdown on SIGTERM or Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, shutting down");
        },
        _ = terminate => {
            tracing::info!("SIGTERM received, shutting down");
        },
    }
}
