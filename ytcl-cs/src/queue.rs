//! Candidate queue for the consensus-labeling front end
//!
//! Serves voters channels they have not voted on yet. Selection is uniform
//! within a bounded batch rather than over the whole unvoted set; with the
//! default batch of 50 that spreads voters well enough without a full table
//! scan per request.

use crate::db::channels::{self, Channel};
use rand::Rng;
use sqlx::SqlitePool;
use ytcl_common::{Error, Result};

/// Default number of unvoted channels fetched per pick
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Hands out unvoted channels to voters
pub struct CandidateQueue {
    db: SqlitePool,
    batch_size: i64,
}

impl CandidateQueue {
    pub fn new(db: SqlitePool, batch_size: i64) -> Self {
        Self {
            db,
            batch_size: batch_size.max(1),
        }
    }

    /// Next channel for this voter, or None when the queue is empty
    ///
    /// An empty queue is an ordinary outcome (the voter has seen
    /// everything), not an error. Returned metadata is placeholder-cleaned.
    pub async fn next(&self, voter_id: &str) -> Result<Option<Channel>> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(Error::Validation("voter_id is required".to_string()));
        }

        let mut batch = channels::candidate_batch(&self.db, voter_id, self.batch_size).await?;
        if batch.is_empty() {
            return Ok(None);
        }

        let pick = rand::thread_rng().gen_range(0..batch.len());
        Ok(Some(batch.swap_remove(pick).cleaned()))
    }
}
