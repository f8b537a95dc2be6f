//! Vote database operations
//!
//! Votes are append-only; the consensus is always recomputed from the full
//! retained history, so there is no upsert path here.

use sqlx::SqlitePool;
use uuid::Uuid;
use ytcl_common::Result;

/// A single recorded vote, as the aggregation step sees it
#[derive(Debug, Clone, Copy)]
pub struct RecordedVote {
    pub is_ai: bool,
    pub weight: f64,
}

/// Persist a vote row
///
/// `shadow_banned` snapshots the voter's reputation flag at vote time; a
/// later reputation change must not rewrite history.
pub async fn insert_vote(
    pool: &SqlitePool,
    channel_id: &Uuid,
    voter_id: &str,
    is_ai: bool,
    weight: f64,
    shadow_banned: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO channel_votes (channel_id, voter_id, is_ai, weight, shadow_banned)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(channel_id.to_string())
    .bind(voter_id)
    .bind(is_ai)
    .bind(weight)
    .bind(shadow_banned)
    .execute(pool)
    .await?;

    Ok(())
}

/// Count of votes already recorded for a channel (shadow-banned included)
///
/// Feeds the decaying weight computation, which keys off total vote volume.
pub async fn count_for_channel(pool: &SqlitePool, channel_id: &Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM channel_votes WHERE channel_id = ?")
            .bind(channel_id.to_string())
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Votes that participate in aggregation: shadow-banned rows are stored but
/// never counted
pub async fn eligible_for_channel(
    pool: &SqlitePool,
    channel_id: &Uuid,
) -> Result<Vec<RecordedVote>> {
    let rows: Vec<(bool, f64)> = sqlx::query_as(
        "SELECT is_ai, weight FROM channel_votes WHERE channel_id = ? AND shadow_banned = 0",
    )
    .bind(channel_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(is_ai, weight)| RecordedVote { is_ai, weight })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> (SqlitePool, Uuid) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        ytcl_common::db::init::create_channels_table(&pool).await.unwrap();
        ytcl_common::db::init::create_voter_reputation_table(&pool).await.unwrap();
        ytcl_common::db::init::create_channel_votes_table(&pool).await.unwrap();

        let channel_id = Uuid::new_v4();
        sqlx::query("INSERT INTO channels (id, identifier) VALUES (?, 'somechannel')")
            .bind(channel_id.to_string())
            .execute(&pool)
            .await
            .unwrap();
        for voter in ["voter-1", "voter-2"] {
            sqlx::query("INSERT INTO voter_reputation (voter_id) VALUES (?)")
                .bind(voter)
                .execute(&pool)
                .await
                .unwrap();
        }

        (pool, channel_id)
    }

    #[tokio::test]
    async fn test_count_and_history_retention() {
        let (pool, channel_id) = setup_test_db().await;

        assert_eq!(count_for_channel(&pool, &channel_id).await.unwrap(), 0);

        insert_vote(&pool, &channel_id, "voter-1", true, 1.0, false).await.unwrap();
        insert_vote(&pool, &channel_id, "voter-1", false, 0.8, false).await.unwrap();

        // Both votes from the same voter are retained
        assert_eq!(count_for_channel(&pool, &channel_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_eligible_excludes_shadow_banned() {
        let (pool, channel_id) = setup_test_db().await;

        insert_vote(&pool, &channel_id, "voter-1", true, 1.0, false).await.unwrap();
        insert_vote(&pool, &channel_id, "voter-2", false, 0.0, true).await.unwrap();

        // Stored...
        assert_eq!(count_for_channel(&pool, &channel_id).await.unwrap(), 2);

        // ...but only the clean vote aggregates
        let eligible = eligible_for_channel(&pool, &channel_id).await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert!(eligible[0].is_ai);
        assert_eq!(eligible[0].weight, 1.0);
    }
}
