//! Unit tests for database initialization
//!
//! Covers automatic database creation, idempotent re-initialization, default
//! settings, and the schema constraints the voting path relies on.

use std::path::PathBuf;
use ytcl_common::db::init::init_database;

fn temp_db_path(tag: &str) -> PathBuf {
    PathBuf::from(format!(
        "/tmp/ytcl-test-db-{}-{}.db",
        tag,
        std::process::id()
    ))
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let db_path = temp_db_path("create");
    let _ = std::fs::remove_file(&db_path);

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());

    assert!(db_path.exists(), "Database file was not created");

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let db_path = temp_db_path("existing");
    let _ = std::fs::remove_file(&db_path);

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Open database second time (should succeed)
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    drop(pool1);
    drop(pool2);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let db_path = temp_db_path("settings");
    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    for key in [
        "http_bind_address",
        "resolver_cache_ttl_seconds",
        "candidate_batch_size",
    ] {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&pool)
                .await
                .unwrap();
        assert!(value.is_some(), "missing default setting '{}'", key);
    }

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_vote_weight_constraint_enforced() {
    let db_path = temp_db_path("constraints");
    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO channels (id, identifier) VALUES ('ch-1', 'somechannel')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO voter_reputation (voter_id) VALUES ('voter-1')")
        .execute(&pool)
        .await
        .unwrap();

    // Weight outside [0, 1] must be rejected by the schema
    let result = sqlx::query(
        "INSERT INTO channel_votes (channel_id, voter_id, is_ai, weight) VALUES ('ch-1', 'voter-1', 1, 1.5)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "out-of-range weight was accepted");

    let result = sqlx::query(
        "INSERT INTO channel_votes (channel_id, voter_id, is_ai, weight) VALUES ('ch-1', 'voter-1', 1, 1.0)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_ok(), "valid vote was rejected: {:?}", result.err());

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_vote_history_is_append_only() {
    let db_path = temp_db_path("history");
    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO channels (id, identifier) VALUES ('ch-1', 'somechannel')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO voter_reputation (voter_id) VALUES ('voter-1')")
        .execute(&pool)
        .await
        .unwrap();

    // The same voter voting twice on the same channel keeps both rows
    for verdict in [1, 0] {
        sqlx::query(
            "INSERT INTO channel_votes (channel_id, voter_id, is_ai, weight) VALUES ('ch-1', 'voter-1', ?, 1.0)",
        )
        .bind(verdict)
        .execute(&pool)
        .await
        .unwrap();
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM channel_votes")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let _ = std::fs::remove_file(&db_path);
}
