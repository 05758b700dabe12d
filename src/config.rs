use std::time::Duration;

/// Deployment-level configuration, read once at startup from the environment
/// (see `AppConfig::from_env`). Mirrors the donor's `AppConfig`/`AppState::new()`
/// convention of grouping `std::env::var` reads up front and failing fast.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub redis_url: String,
    pub redis_pool_max_size: u32,
    pub redis_pool_min_idle: u32,
    pub notifier_base_url: String,
    pub scheduler_tick_interval_ms: u64,
    pub admin_http_addr: String,
    pub constants: GameConstants,
    pub difficulty: DifficultyTable,
}

impl AppConfig {
    /// Read configuration from the environment. Falls back to sane defaults
    /// for everything except `REDIS_URL`, which must be set.
    pub fn from_env() -> Result<Self, crate::errors::AppError> {
        let redis_url = std::env::var("REDIS_URL")
            .map_err(|_| crate::errors::AppError::EnvError("REDIS_URL not set".into()))?;

        let notifier_base_url = std::env::var("NOTIFIER_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());

        let redis_pool_max_size = env_or("REDIS_POOL_MAX_SIZE", 50);
        let redis_pool_min_idle = env_or("REDIS_POOL_MIN_IDLE", 5);
        let scheduler_tick_interval_ms = env_or("SCHEDULER_TICK_INTERVAL_MS", 500);
        let admin_http_addr =
            std::env::var("ADMIN_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8090".to_string());

        Ok(Self {
            redis_url,
            redis_pool_max_size,
            redis_pool_min_idle,
            notifier_base_url,
            scheduler_tick_interval_ms,
            admin_http_addr,
            constants: GameConstants::default(),
            difficulty: DifficultyTable::default(),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Game-wide constants, fixed per deployment (§6.3). These are simulation
/// constants, not deployment wiring, and are kept distinct from the fields
/// above even though both live on `AppConfig`.
#[derive(Clone, Copy, Debug)]
pub struct GameConstants {
    pub ship_cost: f64,
    pub default_production_rate: f64,
    pub resource_tick_interval_ms: i64,
    pub resource_updates_per_min: f64,
    pub stale_game_timeout_ms: i64,
    pub min_armada_travel_time_ms: i64,
    pub event_processing_time_buffer_ms: i64,
    pub max_slots: u8,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            ship_cost: 10.0,
            default_production_rate: 1.0,
            resource_tick_interval_ms: 10_000,
            resource_updates_per_min: 6.0,
            stale_game_timeout_ms: Duration::from_secs(30 * 60).as_millis() as i64,
            min_armada_travel_time_ms: 1_000,
            event_processing_time_buffer_ms: 100,
            max_slots: 6,
        }
    }
}

/// Parameters for a single AI difficulty tier (§4.5).
#[derive(Clone, Copy, Debug)]
pub struct DifficultyParams {
    pub cooldown_ms: i64,
    pub attack_min_source_ships: u32,
    pub attack_min_advantage: u32,
    pub attack_min_ships_to_send: u32,
    pub attack_defense_buffer: u32,
    pub build_resource_multiplier: f64,
    pub build_min_ships_on_planet: u32,
    pub build_max_build_at_once: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct DifficultyTable {
    pub easy: DifficultyParams,
    pub medium: DifficultyParams,
    pub hard: DifficultyParams,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            easy: DifficultyParams {
                cooldown_ms: 30_000,
                attack_min_source_ships: 10,
                attack_min_advantage: 4,
                attack_min_ships_to_send: 5,
                attack_defense_buffer: 4,
                build_resource_multiplier: 2.0,
                build_min_ships_on_planet: 3,
                build_max_build_at_once: 2,
            },
            medium: DifficultyParams {
                cooldown_ms: 10_000,
                attack_min_source_ships: 5,
                attack_min_advantage: 2,
                attack_min_ships_to_send: 4,
                attack_defense_buffer: 2,
                build_resource_multiplier: 1.5,
                build_min_ships_on_planet: 2,
                build_max_build_at_once: 5,
            },
            hard: DifficultyParams {
                cooldown_ms: 2_000,
                attack_min_source_ships: 2,
                attack_min_advantage: 0,
                attack_min_ships_to_send: 2,
                attack_defense_buffer: 0,
                build_resource_multiplier: 1.0,
                build_min_ships_on_planet: 0,
                build_max_build_at_once: 20,
            },
        }
    }
}

impl DifficultyTable {
    pub fn for_difficulty(&self, difficulty: crate::model::game_record::Difficulty) -> &DifficultyParams {
        use crate::model::game_record::Difficulty;
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}
