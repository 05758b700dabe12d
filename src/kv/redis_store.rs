//! `RedisKvStore`: the concrete `KvStore` backing used in production,
//! grounded on the donor's `RedisClient = bb8::Pool<RedisConnectionManager>`
//! convention (`state.rs`) and its `conn.get().await.map_err(...)` pool-error
//! mapping (`db/game/get.rs`, `db/game/post.rs`). Optimistic concurrency is
//! not something the donor's own Redis layer does anywhere, so the CAS here
//! is a new mechanism built from a crate already in the donor's stack
//! (`redis::Script`, i.e. a server-side Lua EVAL) rather than a hand-rolled
//! WATCH/MULTI/EXEC retry loop.

use crate::errors::StoreError;
use crate::kv::{KvEntry, KvStore};
use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use once_cell::sync::Lazy;
use redis::{AsyncCommands, Script};
use serde_json::Value;

pub type RedisPool = Pool<RedisConnectionManager>;

/// Each value is stored as a two-field hash: `value` (JSON text) and
/// `version` (the caller-supplied version token — for `GameRecord`s this is
/// `lastUpdateAt` itself, not a Redis-generated identifier). A missing key
/// has no version.
pub struct RedisKvStore {
    pool: RedisPool,
}

impl RedisKvStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

/// `KEYS[1]` = hash key, `ARGV[1]` = json value, `ARGV[2]` = expected version
/// ("" means "must not already exist"), `ARGV[3]` = new version to set.
/// Returns `"OK"` on success, or `"CONFLICT:<actual>"` when the expected
/// version doesn't match so the Rust side can distinguish a real error from a
/// CAS failure without a second round trip.
static PUT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local key = KEYS[1]
        local new_value = ARGV[1]
        local expected_version = ARGV[2]
        local new_version = ARGV[3]
        local current_version = redis.call('HGET', key, 'version')

        if expected_version == '' then
            if current_version then
                return 'CONFLICT:' .. current_version
            end
        else
            if current_version ~= expected_version then
                return 'CONFLICT:' .. (current_version or '')
            end
        end

        redis.call('HSET', key, 'value', new_value, 'version', new_version)
        return 'OK'
        "#,
    )
});

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<KvEntry>, StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;

        let fields: Vec<(String, String)> = conn
            .hgetall(key)
            .await
            .map_err(|e| StoreError::Io(format!("redis HGETALL failed: {e}")))?;

        if fields.is_empty() {
            return Ok(None);
        }

        let mut value: Option<String> = None;
        let mut version: Option<String> = None;
        for (field, data) in fields {
            match field.as_str() {
                "value" => value = Some(data),
                "version" => version = Some(data),
                _ => {}
            }
        }

        let (value, version) = match (value, version) {
            (Some(v), Some(ver)) => (v, ver),
            _ => return Ok(None),
        };

        let value: Value = serde_json::from_str(&value)
            .map_err(|e| StoreError::Io(format!("corrupt stored JSON: {e}")))?;

        Ok(Some(KvEntry { value, version }))
    }

    async fn put(
        &self,
        key: &str,
        value: &Value,
        expected_version: Option<&str>,
        new_version: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;

        let json = serde_json::to_string(value)
            .map_err(|e| StoreError::Io(format!("failed to serialize value: {e}")))?;

        let result: String = PUT_SCRIPT
            .key(key)
            .arg(json)
            .arg(expected_version.unwrap_or(""))
            .arg(new_version)
            .invoke_async(&mut *conn)
            .await
            .map_err(|e| StoreError::Io(format!("redis EVAL failed: {e}")))?;

        if let Some(actual) = result.strip_prefix("CONFLICT:") {
            return Err(StoreError::VersionConflict {
                actual: actual.to_string(),
            });
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;
        let _: () = conn
            .del(key)
            .await
            .map_err(|e| StoreError::Io(format!("redis DEL failed: {e}")))?;
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;
        let pattern = format!("{prefix}*");
        conn.keys(&pattern)
            .await
            .map_err(|e| StoreError::Io(format!("redis KEYS failed: {e}")))
    }

    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;
        let _: () = conn
            .sadd(set_key, member)
            .await
            .map_err(|e| StoreError::Io(format!("redis SADD failed: {e}")))?;
        Ok(())
    }

    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;
        let _: () = conn
            .srem(set_key, member)
            .await
            .map_err(|e| StoreError::Io(format!("redis SREM failed: {e}")))?;
        Ok(())
    }

    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;
        conn.smembers(set_key)
            .await
            .map_err(|e| StoreError::Io(format!("redis SMEMBERS failed: {e}")))
    }

    async fn hash_increment(&self, key: &str, field: &str, amount: i64) -> Result<i64, StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Io(format!("redis pool error: {e}")))?;
        conn.hincr(key, field, amount)
            .await
            .map_err(|e| StoreError::Io(format!("redis HINCRBY failed: {e}")))
    }
}
