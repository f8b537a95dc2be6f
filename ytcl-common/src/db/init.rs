//! Database initialization
//!
//! Creates the database on first run and brings an existing one up to the
//! current schema. All statements are idempotent (`CREATE TABLE IF NOT
//! EXISTS`), so every service can call [`init_database`] at startup without
//! coordination.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer, which matters for
    // classification reads racing vote submissions
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Bound lock waits so a contended write surfaces as an error instead of
    // blocking a request indefinitely
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_settings_table(&pool).await?;
    create_channels_table(&pool).await?;
    create_voter_reputation_table(&pool).await?;
    create_channel_votes_table(&pool).await?;
    create_channel_predictions_table(&pool).await?;

    // Initialize default settings
    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create the settings table
///
/// Stores application configuration key-value pairs. `updated_at` is bumped
/// on every write so readers holding an in-memory copy can detect external
/// mutation.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the channels table
///
/// One row per referenced channel, keyed internally by UUID and externally
/// by the normalized identifier. Metadata columns are nullable and filled
/// in by merge as information arrives.
pub async fn create_channels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            identifier TEXT NOT NULL UNIQUE,
            handle TEXT,
            channel_title TEXT,
            description TEXT,
            sample_video_id TEXT,
            sample_thumbnail TEXT,
            sample_title TEXT,
            sample_description TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (identifier <> '')
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_channels_identifier ON channels(identifier)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_channels_handle ON channels(handle)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the voter_reputation table
///
/// `shadow_banned` is administrative input; nothing in the voting path
/// writes it.
pub async fn create_voter_reputation_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS voter_reputation (
            voter_id TEXT PRIMARY KEY,
            shadow_banned INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (voter_id <> ''),
            CHECK (shadow_banned IN (0, 1))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the channel_votes table
///
/// Append-only: a voter may vote on the same channel more than once and
/// every row is retained, because the consensus is recomputed from the full
/// history. `shadow_banned` snapshots the voter's flag at vote time.
pub async fn create_channel_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channel_votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
            voter_id TEXT NOT NULL REFERENCES voter_reputation(voter_id) ON DELETE CASCADE,
            is_ai INTEGER NOT NULL CHECK (is_ai IN (0, 1)),
            weight REAL NOT NULL CHECK (weight >= 0.0 AND weight <= 1.0),
            shadow_banned INTEGER NOT NULL DEFAULT 0 CHECK (shadow_banned IN (0, 1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_channel_votes_channel ON channel_votes(channel_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_channel_votes_voter ON channel_votes(voter_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the channel_predictions table
///
/// Append-only audit trail; the newest row per channel is the authoritative
/// classification.
pub async fn create_channel_predictions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channel_predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
            is_ai INTEGER NOT NULL CHECK (is_ai IN (0, 1)),
            confidence REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
            model_version TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_channel_predictions_channel ON channel_predictions(channel_id, id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values; a NULL value is
/// reset to its default.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // HTTP server settings
    ensure_setting(pool, "http_bind_address", "127.0.0.1:5730").await?;

    // Resolver settings
    ensure_setting(pool, "resolver_cache_ttl_seconds", "300").await?; // 5 minutes

    // Labeler queue settings
    ensure_setting(pool, "candidate_batch_size", "50").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // Use INSERT OR IGNORE to handle concurrent initialization race
        // conditions; multiple callers may pass the exists check at once
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        tracing::warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}
