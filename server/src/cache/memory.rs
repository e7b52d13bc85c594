//! In-memory cache backend.
//!
//! Honors TTLs against the clock port so sliding windows, circuit timeouts,
//! and block expiries can be driven deterministically in tests. Not a
//! production backend: state is process-local, which the deployment model
//! forbids for the real engines.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::clock::SharedClock;

use super::{Cache, CacheError, CacheResult};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Zset(HashMap<String, f64>),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

/// Mutex-guarded map of entries with per-key expiry.
pub struct MemoryCache {
    clock: SharedClock,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Creates an empty cache reading expiry from `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn expiry(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(ttl)
            .ok()
            .map(|d| self.clock.now() + d)
    }

    fn is_expired(entry: &Entry, now: DateTime<Utc>) -> bool {
        entry.expires_at.is_some_and(|at| at <= now)
    }

    fn live<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|e| Self::is_expired(e, now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::Protocol(format!("wrong value type at key {key}"))
}

#[async_trait]
impl Cache for MemoryCache {
    async fn incr(&self, key: &str) -> CacheResult<i64> {
        self.incr_by(key, 1).await
    }

    async fn incr_by(&self, key: &str, by: i64) -> CacheResult<i64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            let Value::Str(s) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            let current: i64 = s
                .parse()
                .map_err(|_| CacheError::Protocol(format!("non-integer counter at {key}")))?;
            let next = current + by;
            *s = next.to_string();
            Ok(next)
        } else {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Str(by.to_string()),
                    expires_at: None,
                },
            );
            Ok(by)
        }
    }

    async fn get_i64(&self, key: &str) -> CacheResult<Option<i64>> {
        Ok(self.get(key).await?.and_then(|s| s.parse().ok()))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match Self::live(&mut entries, key, now) {
            Some(entry) => match &entry.value {
                Value::Str(s) => Ok(Some(s.clone())),
                _ => Err(wrong_type(key)),
            },
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let expires_at = self.expiry(ttl);
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        let now = self.clock.now();
        let expires_at = self.expiry(ttl);
        let mut entries = self.entries.lock().await;
        if Self::live(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(Self::live(&mut entries, key, now).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        let now = self.clock.now();
        let expires_at = self.expiry(ttl);
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            entry.expires_at = expires_at;
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(Self::live(&mut entries, key, now)
            .and_then(|e| e.expires_at)
            .and_then(|at| (at - now).to_std().ok()))
    }

    async fn hash_get_all(&self, key: &str) -> CacheResult<HashMap<String, String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match Self::live(&mut entries, key, now) {
            Some(entry) => match &entry.value {
                Value::Hash(map) => Ok(map.clone()),
                _ => Err(wrong_type(key)),
            },
            None => Ok(HashMap::new()),
        }
    }

    async fn hash_set(
        &self,
        key: &str,
        fields: &[(&str, String)],
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let now = self.clock.now();
        let expires_at = ttl.and_then(|ttl| self.expiry(ttl));
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            let Value::Hash(map) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            for (field, value) in fields {
                map.insert((*field).to_string(), value.clone());
            }
            if expires_at.is_some() {
                entry.expires_at = expires_at;
            }
        } else {
            let map = fields
                .iter()
                .map(|(f, v)| ((*f).to_string(), v.clone()))
                .collect();
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Hash(map),
                    expires_at,
                },
            );
        }
        Ok(())
    }

    async fn hash_incr(&self, key: &str, field: &str, by: i64) -> CacheResult<i64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            let Value::Hash(map) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            let current: i64 = map.get(field).and_then(|v| v.parse().ok()).unwrap_or(0);
            let next = current + by;
            map.insert(field.to_string(), next.to_string());
            Ok(next)
        } else {
            let mut map = HashMap::new();
            map.insert(field.to_string(), by.to_string());
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Hash(map),
                    expires_at: None,
                },
            );
            Ok(by)
        }
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> CacheResult<()> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            let Value::Zset(set) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            set.insert(member.to_string(), score);
        } else {
            let mut set = HashMap::new();
            set.insert(member.to_string(), score);
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Zset(set),
                    expires_at: None,
                },
            );
        }
        Ok(())
    }

    async fn zcount(&self, key: &str, min: f64, max: f64) -> CacheResult<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match Self::live(&mut entries, key, now) {
            Some(entry) => match &entry.value {
                Value::Zset(set) => {
                    Ok(set.values().filter(|s| **s >= min && **s <= max).count() as u64)
                }
                _ => Err(wrong_type(key)),
            },
            None => Ok(0),
        }
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> CacheResult<Vec<(String, f64)>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match Self::live(&mut entries, key, now) {
            Some(entry) => match &entry.value {
                Value::Zset(set) => {
                    let mut members: Vec<(String, f64)> = set
                        .iter()
                        .filter(|(_, s)| **s >= min && **s <= max)
                        .map(|(m, s)| (m.clone(), *s))
                        .collect();
                    members.sort_by(|a, b| a.1.total_cmp(&b.1));
                    Ok(members)
                }
                _ => Err(wrong_type(key)),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> CacheResult<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        match Self::live(&mut entries, key, now) {
            Some(entry) => match &mut entry.value {
                Value::Zset(set) => {
                    let before = set.len();
                    set.retain(|_, s| *s < min || *s > max);
                    Ok((before - set.len()) as u64)
                }
                _ => Err(wrong_type(key)),
            },
            None => Ok(0),
        }
    }

    async fn list_push(&self, key: &str, value: &str) -> CacheResult<u64> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            let Value::List(list) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            list.push(value.to_string());
            Ok(list.len() as u64)
        } else {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::List(vec![value.to_string()]),
                    expires_at: None,
                },
            );
            Ok(1)
        }
    }

    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> CacheResult<()> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key, now) {
            let Value::List(list) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            let len = list.len() as i64;
            let resolve = |idx: i64| -> i64 {
                if idx < 0 {
                    (len + idx).max(0)
                } else {
                    idx.min(len)
                }
            };
            let start = resolve(start);
            let stop = (resolve(stop) + 1).min(len);
            *list = if start >= stop {
                Vec::new()
            } else {
                list[start as usize..stop as usize].to_vec()
            };
        }
        Ok(())
    }

    async fn sliding_window(
        &self,
        key: &str,
        cutoff: f64,
        member: &str,
        score: f64,
        ttl: Duration,
    ) -> CacheResult<u64> {
        // Single lock acquisition stands in for the pipelined atomic group.
        let now = self.clock.now();
        let expires_at = self.expiry(ttl);
        let mut entries = self.entries.lock().await;
        let entry = if let Some(entry) = Self::live(&mut entries, key, now) {
            entry
        } else {
            entries.insert(
                key.to_string(),
                Entry {
                    value: Value::Zset(HashMap::new()),
                    expires_at: None,
                },
            );
            entries
                .get_mut(key)
                .ok_or_else(|| CacheError::Protocol("entry vanished under lock".into()))?
        };
        let Value::Zset(set) = &mut entry.value else {
            return Err(wrong_type(key));
        };
        set.retain(|_, s| *s > cutoff);
        set.insert(member.to_string(), score);
        entry.expires_at = expires_at;
        Ok(set.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use crate::clock::ManualClock;

    use super::*;

    fn cache_with_clock() -> (Arc<ManualClock>, MemoryCache) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = MemoryCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_set_get_respects_ttl() {
        let (clock, cache) = cache_with_clock();
        cache
            .set_ex("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        clock.advance(chrono::Duration::seconds(11));
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_creates_and_counts() {
        let (_clock, cache) = cache_with_clock();
        assert_eq!(cache.incr("c").await.unwrap(), 1);
        assert_eq!(cache.incr("c").await.unwrap(), 2);
        assert_eq!(cache.incr_by("c", 5).await.unwrap(), 7);
        assert_eq!(cache.get_i64("c").await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_set_nx_only_first_wins() {
        let (clock, cache) = cache_with_clock();
        assert!(cache
            .set_nx_ex("lock", "a", Duration::from_secs(5))
            .await
            .unwrap());
        assert!(!cache
            .set_nx_ex("lock", "b", Duration::from_secs(5))
            .await
            .unwrap());

        clock.advance(chrono::Duration::seconds(6));
        assert!(cache
            .set_nx_ex("lock", "c", Duration::from_secs(5))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_hash_roundtrip_and_incr() {
        let (_clock, cache) = cache_with_clock();
        cache
            .hash_set("h", &[("state", "closed".to_string())], None)
            .await
            .unwrap();
        assert_eq!(cache.hash_incr("h", "failures", 1).await.unwrap(), 1);
        assert_eq!(cache.hash_incr("h", "failures", 1).await.unwrap(), 2);

        let map = cache.hash_get_all("h").await.unwrap();
        assert_eq!(map.get("state").map(String::as_str), Some("closed"));
        assert_eq!(map.get("failures").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_sliding_window_prunes_and_counts() {
        let (_clock, cache) = cache_with_clock();
        assert_eq!(
            cache
                .sliding_window("w", 0.0, "a", 10.0, Duration::from_secs(60))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            cache
                .sliding_window("w", 0.0, "b", 20.0, Duration::from_secs(60))
                .await
                .unwrap(),
            2
        );
        // Cutoff at 15 prunes member "a".
        assert_eq!(
            cache
                .sliding_window("w", 15.0, "c", 30.0, Duration::from_secs(60))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_zset_ops() {
        let (_clock, cache) = cache_with_clock();
        cache.zadd("z", 1.0, "a").await.unwrap();
        cache.zadd("z", 2.0, "b").await.unwrap();
        cache.zadd("z", 3.0, "c").await.unwrap();

        assert_eq!(cache.zcount("z", 1.5, 3.5).await.unwrap(), 2);

        let range = cache.zrange_by_score("z", 0.0, 2.5).await.unwrap();
        assert_eq!(
            range,
            vec![("a".to_string(), 1.0), ("b".to_string(), 2.0)]
        );

        assert_eq!(cache.zrem_range_by_score("z", 0.0, 2.0).await.unwrap(), 2);
        assert_eq!(cache.zcount("z", 0.0, 10.0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_push_trim() {
        let (_clock, cache) = cache_with_clock();
        for v in ["a", "b", "c", "d"] {
            cache.list_push("l", v).await.unwrap();
        }
        cache.list_trim("l", -2, -1).await.unwrap();
        assert_eq!(cache.list_push("l", "e").await.unwrap(), 3);
    }
}
