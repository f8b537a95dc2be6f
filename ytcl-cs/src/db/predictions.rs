//! Consensus prediction database operations
//!
//! Predictions are an append-only audit trail; the newest row per channel
//! is the authoritative classification. Only the voting engine writes here.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use ytcl_common::Result;

/// Model tag recorded on predictions produced by the voting engine
pub const CONSENSUS_MODEL_VERSION: &str = "consensus-v1";

/// Stored consensus prediction
#[derive(Debug, Clone)]
pub struct Prediction {
    pub is_ai: bool,
    pub confidence: f64,
    pub model_version: String,
    pub created_at: String,
}

/// A flagged channel joined with its prediction, for review listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct FlaggedChannel {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub is_ai: bool,
    pub confidence: f64,
    pub model_version: String,
    pub predicted_at: String,
}

/// Append a prediction row (prior rows are never touched)
pub async fn insert_prediction(
    pool: &SqlitePool,
    channel_id: &Uuid,
    is_ai: bool,
    confidence: f64,
    model_version: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO channel_predictions (channel_id, is_ai, confidence, model_version)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(channel_id.to_string())
    .bind(is_ai)
    .bind(confidence)
    .bind(model_version)
    .execute(pool)
    .await?;

    Ok(())
}

/// Newest prediction for a channel, or None if never predicted
///
/// Ordered by rowid rather than created_at: CURRENT_TIMESTAMP has second
/// resolution and consecutive votes land inside one second.
pub async fn latest_for_channel(
    pool: &SqlitePool,
    channel_id: &Uuid,
) -> Result<Option<Prediction>> {
    let row = sqlx::query(
        r#"
        SELECT is_ai, confidence, model_version, created_at
        FROM channel_predictions
        WHERE channel_id = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(channel_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Prediction {
        is_ai: row.get("is_ai"),
        confidence: row.get("confidence"),
        model_version: row.get("model_version"),
        created_at: row.get("created_at"),
    }))
}

/// Newest AI-flagged predictions joined to their channels
pub async fn list_flagged(
    pool: &SqlitePool,
    limit: i64,
    min_confidence: f64,
) -> Result<Vec<FlaggedChannel>> {
    let rows = sqlx::query(
        r#"
        SELECT c.identifier, c.handle, p.is_ai, p.confidence, p.model_version, p.created_at
        FROM channel_predictions p
        JOIN channels c ON c.id = p.channel_id
        WHERE p.is_ai = 1 AND p.confidence >= ?
        ORDER BY p.id DESC
        LIMIT ?
        "#,
    )
    .bind(min_confidence)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| FlaggedChannel {
            identifier: row.get("identifier"),
            handle: row.get("handle"),
            is_ai: row.get("is_ai"),
            confidence: row.get("confidence"),
            model_version: row.get("model_version"),
            predicted_at: row.get("created_at"),
        })
        .collect())
}
