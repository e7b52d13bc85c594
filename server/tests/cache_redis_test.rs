//! Redis cache backend integration tests.
//!
//! These tests require a running Redis instance at `redis://localhost:6379`.
//! Run with: `cargo test --test cache_redis_test --ignored -- --nocapture`

use std::time::Duration;

use rift_server::cache::{Cache, RedisCache};
use uuid::Uuid;

/// Helper to create a test cache connected to localhost.
async fn create_test_cache() -> RedisCache {
    RedisCache::connect("redis://localhost:6379")
        .await
        .expect("Failed to connect to Redis")
}

/// Unique key prefix per test run to avoid conflicts.
fn test_key(suffix: &str) -> String {
    format!("test:cache:{}:{suffix}", Uuid::now_v7())
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_counter_roundtrip() {
    let cache = create_test_cache().await;
    let key = test_key("counter");

    assert_eq!(cache.incr(&key).await.unwrap(), 1);
    assert_eq!(cache.incr(&key).await.unwrap(), 2);
    assert_eq!(cache.incr_by(&key, 5).await.unwrap(), 7);
    assert_eq!(cache.get_i64(&key).await.unwrap(), Some(7));

    cache.del(&key).await.unwrap();
    assert_eq!(cache.get_i64(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_set_nx_lock_semantics() {
    let cache = create_test_cache().await;
    let key = test_key("lock");

    assert!(cache
        .set_nx_ex(&key, "owner-a", Duration::from_secs(5))
        .await
        .unwrap());
    assert!(!cache
        .set_nx_ex(&key, "owner-b", Duration::from_secs(5))
        .await
        .unwrap());

    cache.del(&key).await.unwrap();
    assert!(cache
        .set_nx_ex(&key, "owner-c", Duration::from_secs(5))
        .await
        .unwrap());
    cache.del(&key).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_hash_fields_and_ttl() {
    let cache = create_test_cache().await;
    let key = test_key("hash");

    cache
        .hash_set(
            &key,
            &[("state", "open".to_string())],
            Some(Duration::from_secs(30)),
        )
        .await
        .unwrap();
    assert_eq!(cache.hash_incr(&key, "failures", 3).await.unwrap(), 3);

    let fields = cache.hash_get_all(&key).await.unwrap();
    assert_eq!(fields.get("state").map(String::as_str), Some("open"));
    assert_eq!(fields.get("failures").map(String::as_str), Some("3"));

    let ttl = cache.ttl(&key).await.unwrap().expect("ttl set");
    assert!(ttl.as_secs() <= 30);
    cache.del(&key).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_sliding_window_pipeline() {
    let cache = create_test_cache().await;
    let key = test_key("window");

    // Three members inside the window.
    for (i, member) in ["a", "b", "c"].iter().enumerate() {
        let count = cache
            .sliding_window(&key, 0.0, member, 100.0 + i as f64, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(count, i as u64 + 1);
    }

    // A cutoff past the first two members prunes them atomically.
    let count = cache
        .sliding_window(&key, 101.5, "d", 200.0, Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(count, 2);

    cache.del(&key).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis
async fn test_zset_range_reads() {
    let cache = create_test_cache().await;
    let key = test_key("zset");

    for (member, score) in [("1000:50", 1_000.0), ("2000:75", 2_000.0), ("3000:60", 3_000.0)] {
        cache.zadd(&key, score, member).await.unwrap();
    }

    assert_eq!(cache.zcount(&key, 1_500.0, 3_500.0).await.unwrap(), 2);

    let range = cache.zrange_by_score(&key, 0.0, 2_500.0).await.unwrap();
    assert_eq!(range.len(), 2);
    assert_eq!(range[0].0, "1000:50");

    assert_eq!(
        cache.zrem_range_by_score(&key, 0.0, 2_500.0).await.unwrap(),
        2
    );
    cache.del(&key).await.unwrap();
}
