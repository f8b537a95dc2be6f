//! Settings database access
//!
//! Read/write settings from the settings table (key-value store). All
//! settings are global/system-wide. The table doubles as the local
//! persistence layer for small JSON blobs (e.g. the manual override map);
//! `setting_updated_at` lets holders of an in-memory copy notice writes
//! made behind their back.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database, bumping `updated_at`.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}

/// Delete a setting if present (no-op otherwise)
pub async fn delete_setting(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;

    Ok(())
}

/// Last-write stamp of a setting row, or None if the key doesn't exist
///
/// Compare stamps across accesses to detect writes made by another process
/// (or another handle in this one) since a value was loaded.
pub async fn setting_updated_at(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let stamp: Option<String> =
        sqlx::query_scalar("SELECT updated_at FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    Ok(stamp)
}
