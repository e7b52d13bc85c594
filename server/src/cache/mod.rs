//! Shared Cache Port
//!
//! All cross-process state (rate-limit windows, circuit documents, block
//! records, fallback responses) lives behind this port. Operations are
//! atomic at the key level; the pipelined sliding-window group is atomic as
//! a group. Components above always define a safe default when the cache is
//! unavailable.

pub mod error;
pub mod memory;
pub mod redis;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use redis::RedisCache;

/// Capability set required of a cache backend.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Atomically increments a counter, creating it at 1.
    async fn incr(&self, key: &str) -> CacheResult<i64>;

    /// Atomically increments a counter by `by`.
    async fn incr_by(&self, key: &str, by: i64) -> CacheResult<i64>;

    /// Reads a counter.
    async fn get_i64(&self, key: &str) -> CacheResult<Option<i64>>;

    /// Reads a string value.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Writes a string value with a TTL.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// SET-if-not-exists with a TTL. Returns whether the key was set; used
    /// for distributed locks (circuit half-open trials).
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// Deletes a key.
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Whether a key exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Refreshes a key's TTL.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()>;

    /// Remaining TTL, or `None` when the key is absent or has no expiry.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Reads every field of a hash. An absent key reads as an empty map.
    async fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>>;

    /// Writes hash fields, optionally refreshing the key TTL.
    async fn hash_set(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Atomically increments a hash field.
    async fn hash_incr(&self, key: &str, field: &str, by: i64) -> CacheResult<i64>;

    /// Inserts a member with a score into a sorted set. Re-inserting an
    /// existing member updates its score.
    async fn zadd(&self, key: &str, score: f64, member: &str) -> CacheResult<()>;

    /// Counts members with score in `[min, max]`.
    async fn zcount(&self, key: &str, min: f64, max: f64) -> CacheResult<u64>;

    /// Members and scores with score in `[min, max]`, ascending by score.
    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> CacheResult<Vec<(String, f64)>>;

    /// Removes members with score in `[min, max]`; returns the count removed.
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> CacheResult<u64>;

    /// Appends a value to a list; returns the new length.
    async fn list_push(&self, key: &str, value: &str) -> CacheResult<u64>;

    /// Trims a list to the index range `[start, stop]`.
    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> CacheResult<()>;

    /// Pipelined atomic group for sliding-window admission: removes members
    /// scored below `cutoff`, inserts `member` at `score`, refreshes the key
    /// TTL, and returns the cardinality after insertion.
    async fn sliding_window(
        &self,
        key: &str,
        cutoff: f64,
        member: &str,
        score: f64,
        ttl: Duration,
    ) -> CacheResult<u64>;
}
