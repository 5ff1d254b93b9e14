use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use linkhop_core::{LinkRecord, ShortCode};
use linkhop_storage::{MySqlRepository, ReadRepository, Repository, StorageError};
use linkhop_test_infra::mysql::{MySqlServer, MysqlConfig};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    mysql: MySqlServer,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        Self::start_with(MysqlConfig::builder().build()).await
    }

    async fn start_with(config: MysqlConfig) -> Self {
        let mysql = MySqlServer::new(config).await.expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        let repo = MySqlRepository::new(pool);
        repo.ensure_schema().await.expect("create schema");

        Self { mysql, repo }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

// the store keeps millisecond precision
fn now_millis() -> Timestamp {
    Timestamp::from_millisecond(Timestamp::now().as_millisecond()).unwrap()
}

fn record(c: &str, target: &str, expires_at: Option<Timestamp>) -> LinkRecord {
    LinkRecord::new(code(c), target, now_millis(), expires_at)
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn insert_and_get_round_trips_all_fields() {
    let fixture = Fixture::start().await;
    let expires_at = now_millis() + SignedDuration::from_hours(1);
    let inserted = record("abc123", "https://example.com/a?b=c", Some(expires_at));

    fixture.repo.ping().await.unwrap();
    fixture.repo.insert(inserted.clone()).await.unwrap();

    let got = fixture.repo.get(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got, inserted);
    assert!(fixture.repo.exists(&code("abc123")).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn insert_conflicts_when_code_already_exists() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(record("abc123", "https://one.example", None))
        .await
        .unwrap();

    let err = fixture
        .repo
        .insert(record("abc123", "https://two.example", None))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn codes_differing_only_in_case_are_distinct() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(record("abcDEF", "https://upper.example", None))
        .await
        .unwrap();
    fixture
        .repo
        .insert(record("abcdef", "https://lower.example", None))
        .await
        .unwrap();

    let upper = fixture.repo.get(&code("abcDEF")).await.unwrap().unwrap();
    let lower = fixture.repo.get(&code("abcdef")).await.unwrap().unwrap();
    assert_eq!(upper.target, "https://upper.example");
    assert_eq!(lower.target, "https://lower.example");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn expired_record_is_still_returned_by_the_store() {
    let fixture = Fixture::start().await;
    let expired = now_millis() - SignedDuration::from_secs(1);

    fixture
        .repo
        .insert(record("expired", "https://example.com", Some(expired)))
        .await
        .unwrap();

    let got = fixture.repo.get(&code("expired")).await.unwrap().unwrap();
    assert!(!got.is_resolvable(Timestamp::now()));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn set_active_soft_deletes_and_keeps_code_taken() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .insert(record("gone", "https://example.com", None))
        .await
        .unwrap();

    assert!(fixture.repo.set_active(&code("gone"), false).await.unwrap());
    // unchanged value still reports the row as present
    assert!(fixture.repo.set_active(&code("gone"), false).await.unwrap());
    assert!(!fixture.repo.set_active(&code("missing"), false).await.unwrap());

    let got = fixture.repo.get(&code("gone")).await.unwrap().unwrap();
    assert!(!got.active);

    let err = fixture
        .repo
        .insert(record("gone", "https://other.example", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn set_expiry_updates_and_clears() {
    let fixture = Fixture::start().await;
    let later = now_millis() + SignedDuration::from_mins(5);

    fixture
        .repo
        .insert(record("abc123", "https://example.com", None))
        .await
        .unwrap();

    let updated = fixture
        .repo
        .set_expiry(&code("abc123"), Some(later))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.expires_at, Some(later));

    let cleared = fixture
        .repo
        .set_expiry(&code("abc123"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.expires_at, None);

    assert!(fixture
        .repo
        .set_expiry(&code("missing"), None)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn schema_from_init_script_is_left_in_place() {
    let config = MysqlConfig::builder()
        .init_sql(include_str!("../ddl/mysql/links.sql"))
        .build();
    let fixture = Fixture::start_with(config).await;

    let collation: String = sqlx::query_scalar("SELECT CAST(@@collation_server AS CHAR)")
        .fetch_one(fixture.repo.pool())
        .await
        .unwrap();
    assert_eq!(collation, fixture.mysql.config().collation());

    // ensure_schema already ran once in the fixture
    fixture.repo.ensure_schema().await.unwrap();
    fixture
        .repo
        .insert(record("init01", "https://example.com", None))
        .await
        .unwrap();
    assert!(fixture.repo.exists(&code("init01")).await.unwrap());
}
