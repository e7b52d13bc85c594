//! Redis cache backend using fred.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use tracing::info;

use super::{Cache, CacheError, CacheResult};

/// Redis-backed cache. Clones share the underlying connection.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    /// Wraps an already-connected client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects to Redis and waits for the connection to come up.
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let config = Config::from_url(redis_url)?;
        let client = Client::new(config, None, None, None);
        client.connect();
        client.wait_for_connect().await?;

        info!("Connected to Redis");
        Ok(Self { client })
    }

    /// The underlying client, for callers that need raw access (tests).
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

fn map_err(e: &Error) -> CacheError {
    match e.kind() {
        ErrorKind::Parse => CacheError::Protocol(e.to_string()),
        _ => CacheError::Unavailable(e.to_string()),
    }
}

fn ttl_secs(ttl: Duration) -> i64 {
    // Redis EXPIRE rejects 0; round sub-second TTLs up.
    (ttl.as_secs() as i64).max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn incr(&self, key: &str) -> CacheResult<i64> {
        self.client.incr(key).await.map_err(|e| map_err(&e))
    }

    async fn incr_by(&self, key: &str, by: i64) -> CacheResult<i64> {
        self.client.incr_by(key, by).await.map_err(|e| map_err(&e))
    }

    async fn get_i64(&self, key: &str) -> CacheResult<Option<i64>> {
        self.client.get(key).await.map_err(|e| map_err(&e))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.client.get(key).await.map_err(|e| map_err(&e))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.client
            .set(key, value, Some(Expiration::EX(ttl_secs(ttl))), None, false)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        let set: Option<String> = self
            .client
            .set(
                key,
                value,
                Some(Expiration::EX(ttl_secs(ttl))),
                Some(SetOptions::NX),
                false,
            )
            .await
            .map_err(|e| map_err(&e))?;
        Ok(set.is_some())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.client
            .del::<(), _>(key)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.client.exists(key).await.map_err(|e| map_err(&e))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        self.client
            .expire::<(), _>(key, ttl_secs(ttl))
            .await
            .map_err(|e| map_err(&e))
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let secs: i64 = self.client.ttl(key).await.map_err(|e| map_err(&e))?;
        // -1 (no expiry) and -2 (missing key) both read as None.
        if secs > 0 {
            Ok(Some(Duration::from_secs(secs as u64)))
        } else {
            Ok(None)
        }
    }

    async fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        self.client.hgetall(key).await.map_err(|e| map_err(&e))
    }

    async fn hash_set(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let map: HashMap<String, String> = fields
            .iter()
            .map(|(f, v)| ((*f).to_string(), v.clone()))
            .collect();
        self.client
            .hset::<(), _, _>(key, map)
            .await
            .map_err(|e| map_err(&e))?;
        if let Some(ttl) = ttl {
            self.client
                .expire::<(), _>(key, ttl_secs(ttl))
                .await
                .map_err(|e| map_err(&e))?;
        }
        Ok(())
    }

    async fn hash_incr(&self, key: &str, field: &str, by: i64) -> CacheResult<i64> {
        self.client
            .hincrby(key, field, by)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> CacheResult<()> {
        self.client
            .zadd::<(), _, _>(key, None, None, false, false, (score, member))
            .await
            .map_err(|e| map_err(&e))
    }

    async fn zcount(&self, key: &str, min: f64, max: f64) -> CacheResult<u64> {
        let count: i64 = self
            .client
            .zcount(key, min, max)
            .await
            .map_err(|e| map_err(&e))?;
        Ok(count.max(0) as u64)
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> CacheResult<Vec<(String, f64)>> {
        self.client
            .zrangebyscore(key, min, max, true, None)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> CacheResult<u64> {
        let removed: i64 = self
            .client
            .zremrangebyscore(key, min, max)
            .await
            .map_err(|e| map_err(&e))?;
        Ok(removed.max(0) as u64)
    }

    async fn list_push(&self, key: &str, value: &str) -> CacheResult<u64> {
        let len: i64 = self
            .client
            .rpush(key, value)
            .await
            .map_err(|e| map_err(&e))?;
        Ok(len.max(0) as u64)
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> CacheResult<()> {
        self.client
            .ltrim::<(), _>(key, start, stop)
            .await
            .map_err(|e| map_err(&e))
    }

    async fn sliding_window(
        &self,
        key: &str,
        cutoff: f64,
        member: &str,
        score: f64,
        ttl: Duration,
    ) -> CacheResult<u64> {
        let pipeline = self.client.pipeline();
        let () = pipeline
            .zremrangebyscore(key, f64::NEG_INFINITY, cutoff)
            .await
            .map_err(|e| map_err(&e))?;
        let () = pipeline
            .zadd(key, None, None, false, false, (score, member))
            .await
            .map_err(|e| map_err(&e))?;
        let () = pipeline.zcard(key).await.map_err(|e| map_err(&e))?;
        let () = pipeline
            .expire(key, ttl_secs(ttl))
            .await
            .map_err(|e| map_err(&e))?;

        let results: Vec<i64> = pipeline.all().await.map_err(|e| map_err(&e))?;
        let cardinality = results
            .get(2)
            .copied()
            .ok_or_else(|| CacheError::Protocol("pipeline returned too few results".into()))?;
        Ok(cardinality.max(0) as u64)
    }
}
