use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use linkhop_cache::{CacheHierarchy, HierarchyConfig, LinkCache, RedisLinkCache};
use linkhop_core::{CacheEntry, LinkRecord, Repository, ShortCode};
use linkhop_storage::InMemoryRepository;
use linkhop_test_infra::redis::RedisServer;
use redis::AsyncCommands;

/// Test fixture that manages a Redis container using test-infra.
struct RedisTestContainer {
    _redis: RedisServer,
    conn: redis::aio::MultiplexedConnection,
}

impl RedisTestContainer {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("start redis");
        let conn = redis.connection().await.expect("redis connection");
        Self {
            _redis: redis,
            conn,
        }
    }
}

fn code(value: &str) -> ShortCode {
    ShortCode::new(value).unwrap()
}

fn entry(target: &str) -> CacheEntry {
    CacheEntry {
        target: target.to_string(),
        expires_at: None,
        active: true,
    }
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn set_get_and_delete() {
    let fixture = RedisTestContainer::start().await;
    let cache = RedisLinkCache::new(fixture.conn.clone());
    let c = code("abc123");

    cache.ping().await.unwrap();
    assert!(cache.get_entry(&c).await.unwrap().is_none());

    cache
        .set_entry(&c, &entry("https://example.com"), Duration::from_secs(60))
        .await
        .unwrap();
    let got = cache.get_entry(&c).await.unwrap().unwrap();
    assert_eq!(got.target, "https://example.com");

    cache.del(&c).await.unwrap();
    assert!(cache.get_entry(&c).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn entries_carry_a_ttl_under_the_link_namespace() {
    let fixture = RedisTestContainer::start().await;
    let cache = RedisLinkCache::new(fixture.conn.clone());

    cache
        .set_entry(&code("ttl1"), &entry("https://example.com"), Duration::from_secs(90))
        .await
        .unwrap();

    let mut conn = fixture.conn.clone();
    let pttl: i64 = conn.pttl("lh:link:ttl1").await.unwrap();
    assert!(pttl > 0 && pttl <= 90_000, "unexpected pttl {pttl}");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn garbage_value_is_reported_as_invalid_data() {
    let fixture = RedisTestContainer::start().await;
    let cache = RedisLinkCache::new(fixture.conn.clone());

    let mut conn = fixture.conn.clone();
    let _: () = conn.set("lh:link:broken", "not json").await.unwrap();

    let err = cache.get_entry(&code("broken")).await.unwrap_err();
    assert!(matches!(err, linkhop_cache::CacheError::InvalidData(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn hierarchy_promotes_store_hits_into_redis() {
    let fixture = RedisTestContainer::start().await;
    let store = Arc::new(InMemoryRepository::new());
    store
        .insert(LinkRecord::new(
            code("promo1"),
            "https://example.com/page",
            Timestamp::now(),
            None,
        ))
        .await
        .unwrap();

    let hierarchy = CacheHierarchy::new(
        RedisLinkCache::new(fixture.conn.clone()),
        Arc::clone(&store),
        HierarchyConfig::default(),
    );

    let got = hierarchy.get(&code("promo1")).await.unwrap().unwrap();
    assert_eq!(got.target, "https://example.com/page");

    let shared = RedisLinkCache::new(fixture.conn.clone());
    assert!(shared.get_entry(&code("promo1")).await.unwrap().is_some());

    hierarchy.invalidate(&code("promo1")).await;
    assert!(shared.get_entry(&code("promo1")).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn custom_prefix_keeps_caches_apart() {
    let fixture = RedisTestContainer::start().await;
    let default = RedisLinkCache::new(fixture.conn.clone());
    let staging = RedisLinkCache::with_prefix(fixture.conn.clone(), "staging:link:");
    let c = code("shared1");

    staging
        .set_entry(&c, &entry("https://staging.example"), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(default.get_entry(&c).await.unwrap().is_none());
    let mut conn = fixture.conn.clone();
    let exists: bool = conn.exists("staging:link:shared1").await.unwrap();
    assert!(exists);
}
