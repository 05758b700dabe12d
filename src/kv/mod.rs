pub mod redis_store;

use crate::errors::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// A stored value and the version token it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub value: Value,
    pub version: String,
}

/// External-contract abstraction over the CAS-capable key/value store the
/// Game Store is built on (§4.1, §9 "KV-store abstraction"). Backed
/// concretely by `RedisKvStore`, but kept as a trait so the Game Store never
/// depends on Redis directly.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<KvEntry>, StoreError>;

    /// Writes `value` under `key`, setting its version token to `new_version`.
    /// If `expected_version` is `Some`, the write only succeeds if the stored
    /// version still matches it (optimistic concurrency control). If
    /// `expected_version` is `None`, the write only succeeds if the key does
    /// not already hold a value (first-time creation). Either way, a mismatch
    /// is reported as `StoreError::VersionConflict`. `new_version` is
    /// caller-supplied rather than generated by the store, since the domain's
    /// version token (`lastUpdateAt`) is meaningful to the caller (§4.1: "the
    /// version token is the stored `lastUpdateAt`").
    async fn put(
        &self,
        key: &str,
        value: &Value,
        expected_version: Option<&str>,
        new_version: &str,
    ) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Full scan fallback for `listGames` when an index is missing or
    /// untrusted (§4.1 "falls back to full scan on cache miss").
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Members of a Redis set, used for the open/active game indexes.
    async fn set_add(&self, set_key: &str, member: &str) -> Result<(), StoreError>;
    async fn set_remove(&self, set_key: &str, member: &str) -> Result<(), StoreError>;
    async fn set_members(&self, set_key: &str) -> Result<Vec<String>, StoreError>;

    /// Best-effort atomic increment of a field in a hash (used by the Stats
    /// Service's daily counters).
    async fn hash_increment(&self, key: &str, field: &str, amount: i64) -> Result<i64, StoreError>;
}
