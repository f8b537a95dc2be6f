//! Voter reputation database operations
//!
//! A reputation row is created on a voter's first vote. The shadow-banned
//! flag is administrative input: operators set it out of band and the
//! voting engine only ever reads it.

use sqlx::SqlitePool;
use ytcl_common::{Error, Result};

/// Voter reputation record
#[derive(Debug, Clone)]
pub struct VoterReputation {
    pub voter_id: String,
    pub shadow_banned: bool,
}

/// Get or create the reputation row for a voter
pub async fn get_or_create(pool: &SqlitePool, voter_id: &str) -> Result<VoterReputation> {
    let voter_id = voter_id.trim();
    if voter_id.is_empty() {
        return Err(Error::Validation("voter_id must not be empty".to_string()));
    }

    // INSERT OR IGNORE absorbs the first-vote race between two submissions
    sqlx::query("INSERT OR IGNORE INTO voter_reputation (voter_id) VALUES (?)")
        .bind(voter_id)
        .execute(pool)
        .await?;

    let row: (String, bool) =
        sqlx::query_as("SELECT voter_id, shadow_banned FROM voter_reputation WHERE voter_id = ?")
            .bind(voter_id)
            .fetch_one(pool)
            .await?;

    Ok(VoterReputation {
        voter_id: row.0,
        shadow_banned: row.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        ytcl_common::db::init::create_voter_reputation_table(&pool).await.unwrap();

        pool
    }

    #[tokio::test]
    async fn test_created_on_first_reference() {
        let pool = setup_test_db().await;

        let rep = get_or_create(&pool, "voter-1").await.unwrap();
        assert_eq!(rep.voter_id, "voter-1");
        assert!(!rep.shadow_banned);

        // Second call finds the same row
        let again = get_or_create(&pool, "voter-1").await.unwrap();
        assert_eq!(again.voter_id, "voter-1");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voter_reputation")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_shadow_ban_flag_is_read() {
        let pool = setup_test_db().await;

        get_or_create(&pool, "banned-voter").await.unwrap();
        sqlx::query("UPDATE voter_reputation SET shadow_banned = 1 WHERE voter_id = 'banned-voter'")
            .execute(&pool)
            .await
            .unwrap();

        let rep = get_or_create(&pool, "banned-voter").await.unwrap();
        assert!(rep.shadow_banned);
    }

    #[tokio::test]
    async fn test_empty_voter_id_rejected() {
        let pool = setup_test_db().await;

        assert!(matches!(
            get_or_create(&pool, "   ").await,
            Err(Error::Validation(_))
        ));
    }
}
