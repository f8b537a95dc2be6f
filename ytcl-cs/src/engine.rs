//! Crowd-consensus voting engine
//!
//! One pass per submission: validate, resolve the channel and voter,
//! compute the decaying vote weight, persist the vote, recompute the
//! channel's consensus from full vote history, and invalidate the
//! resolver's cache entry. Nothing is persisted before validation passes,
//! and the consensus step never runs if the vote failed to persist.

use crate::db::{channels, predictions, reputation, votes};
use crate::db::channels::{Channel, ChannelMetadata};
use crate::resolver::ClassificationResolver;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use ytcl_common::{Error, Result};

/// Weighted score above which the consensus verdict is "AI"
const AI_SCORE_THRESHOLD: f64 = 0.6;

/// Floor below which a vote's weight never decays
const WEIGHT_FLOOR: f64 = 0.1;

/// A vote submission as the API hands it over
#[derive(Debug, Clone, Default)]
pub struct VoteRequest {
    /// Internal channel ID of an existing channel
    pub channel_id: Option<String>,
    /// Raw identifier, resolved or created on demand
    pub identifier: Option<String>,
    pub voter_id: String,
    pub is_ai: bool,
    pub metadata: Option<ChannelMetadata>,
}

/// Decaying per-vote weight from prior vote volume
///
/// `max(0.1, 1.0 - 0.2 * log10(n + 1))` for `n` existing votes: the first
/// voter counts fully, the tenth 0.8, the hundredth 0.6, with a floor of
/// 0.1 so a late dissenting voter is dampened but never silenced. Bounds
/// the effect of pile-on brigading.
pub fn vote_weight(prior_votes: i64) -> f64 {
    let n = prior_votes.max(0) as f64;
    (1.0 - 0.2 * (n + 1.0).log10()).max(WEIGHT_FLOOR)
}

/// Weighted-average AI score over the eligible vote set
///
/// Returns None when the set is empty (or carries no weight), meaning no
/// consensus can be formed.
pub fn consensus_score(eligible: &[votes::RecordedVote]) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for vote in eligible {
        if vote.is_ai {
            weighted_sum += vote.weight;
        }
        total_weight += vote.weight;
    }

    if total_weight > 0.0 {
        Some(weighted_sum / total_weight)
    } else {
        None
    }
}

/// Accepts votes and maintains the per-channel consensus
pub struct VotingEngine {
    db: SqlitePool,
    resolver: Arc<ClassificationResolver>,
}

impl VotingEngine {
    pub fn new(db: SqlitePool, resolver: Arc<ClassificationResolver>) -> Self {
        Self { db, resolver }
    }

    /// Submit one vote and return the weight it was assigned
    ///
    /// The weight is returned for transparency; the internal score and
    /// threshold are not exposed.
    pub async fn submit_vote(&self, request: &VoteRequest) -> Result<f64> {
        // Step 1: validation, before anything touches the database
        let voter_id = request.voter_id.trim();
        if voter_id.is_empty() {
            return Err(Error::Validation("voter_id is required".to_string()));
        }
        if request.channel_id.is_none()
            && request.identifier.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            return Err(Error::Validation(
                "either channel_id or identifier is required".to_string(),
            ));
        }

        // Step 2: resolve or create the channel
        let channel = self.resolve_channel(request).await?;

        // Step 3: resolve or create the voter's reputation
        let rep = reputation::get_or_create(&self.db, voter_id).await?;

        // Step 4: weight. Shadow-banned votes are recorded with zero weight
        // and contribute nothing; everyone else decays with vote volume.
        let weight = if rep.shadow_banned {
            0.0
        } else {
            let prior = votes::count_for_channel(&self.db, &channel.id).await?;
            vote_weight(prior)
        };

        // Step 5: persist the vote with the reputation flag as of now
        votes::insert_vote(
            &self.db,
            &channel.id,
            voter_id,
            request.is_ai,
            weight,
            rep.shadow_banned,
        )
        .await?;

        debug!(
            "Recorded vote on {} by {}: is_ai={} weight={:.3}",
            channel.identifier, voter_id, request.is_ai, weight
        );

        // Step 6: recompute consensus from the full vote history
        self.recompute_consensus(&channel).await?;

        // Step 7: the resolver may hold a stale entry under the channel's
        // identifier or its handle; drop both
        self.resolver.invalidate(Some(&channel.identifier));
        if let Some(handle) = channel.handle.as_deref() {
            self.resolver.invalidate(Some(handle));
        }

        Ok(weight)
    }

    async fn resolve_channel(&self, request: &VoteRequest) -> Result<Channel> {
        if let Some(raw_id) = request.channel_id.as_deref() {
            let id = Uuid::parse_str(raw_id.trim())
                .map_err(|_| Error::Validation(format!("invalid channel_id: {:?}", raw_id)))?;
            let channel = channels::get_by_id(&self.db, &id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("channel {}", id)))?;

            match request.metadata.as_ref() {
                Some(metadata) => channels::merge_metadata(&self.db, &channel.id, metadata).await,
                None => Ok(channel),
            }
        } else {
            // Presence checked during validation
            let identifier = request.identifier.as_deref().unwrap_or_default();
            channels::get_or_create(&self.db, identifier, request.metadata.as_ref()).await
        }
    }

    /// Re-derive the channel's consensus from its full eligible vote
    /// history and append a prediction row
    ///
    /// Skipped entirely when no eligible votes exist (e.g. every vote so
    /// far is shadow-banned).
    async fn recompute_consensus(&self, channel: &Channel) -> Result<()> {
        let eligible = votes::eligible_for_channel(&self.db, &channel.id).await?;

        let score = match consensus_score(&eligible) {
            Some(score) => score,
            None => {
                debug!(
                    "No eligible votes for {}; consensus unchanged",
                    channel.identifier
                );
                return Ok(());
            }
        };

        let is_ai = score > AI_SCORE_THRESHOLD;
        let confidence = score.max(1.0 - score);

        predictions::insert_prediction(
            &self.db,
            &channel.id,
            is_ai,
            confidence,
            predictions::CONSENSUS_MODEL_VERSION,
        )
        .await?;

        info!(
            "Consensus for {}: is_ai={} confidence={:.3} ({} votes)",
            channel.identifier,
            is_ai,
            confidence,
            eligible.len()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_weight_anchor_points() {
        assert!((vote_weight(0) - 1.0).abs() < 1e-9);
        assert!((vote_weight(9) - 0.8).abs() < 1e-9);
        assert!((vote_weight(99) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_vote_weight_monotonic_and_floored() {
        let mut previous = f64::INFINITY;
        for n in [0, 1, 5, 9, 50, 99, 1_000, 100_000, 10_000_000] {
            let weight = vote_weight(n);
            assert!(weight <= previous, "weight increased at n={}", n);
            assert!(weight >= WEIGHT_FLOOR);
            assert!(weight <= 1.0);
            previous = weight;
        }

        // Deep into the tail the floor holds exactly
        assert_eq!(vote_weight(i64::MAX), WEIGHT_FLOOR);
    }

    #[test]
    fn test_consensus_score_weighted_average() {
        let eligible = vec![
            votes::RecordedVote { is_ai: true, weight: 1.0 },
            votes::RecordedVote { is_ai: false, weight: 1.0 },
        ];
        assert!((consensus_score(&eligible).unwrap() - 0.5).abs() < 1e-9);

        // A heavier AI vote pulls the score up
        let eligible = vec![
            votes::RecordedVote { is_ai: true, weight: 1.0 },
            votes::RecordedVote { is_ai: false, weight: 0.5 },
        ];
        assert!((consensus_score(&eligible).unwrap() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_consensus_score_empty_set() {
        assert_eq!(consensus_score(&[]), None);

        // Only zero-weight rows carry no consensus either
        let eligible = vec![votes::RecordedVote { is_ai: true, weight: 0.0 }];
        assert_eq!(consensus_score(&eligible), None);
    }

    #[test]
    fn test_threshold_classification() {
        // Weighted score 0.61: just over the line, AI with confidence 0.61
        let eligible = vec![
            votes::RecordedVote { is_ai: true, weight: 0.61 },
            votes::RecordedVote { is_ai: false, weight: 0.39 },
        ];
        let score = consensus_score(&eligible).unwrap();
        assert!((score - 0.61).abs() < 1e-9);
        assert!(score > AI_SCORE_THRESHOLD);
        assert!((score.max(1.0 - score) - 0.61).abs() < 1e-9);

        // Weighted score 0.4: human with confidence 0.6
        let eligible = vec![
            votes::RecordedVote { is_ai: true, weight: 0.4 },
            votes::RecordedVote { is_ai: false, weight: 0.6 },
        ];
        let score = consensus_score(&eligible).unwrap();
        assert!((score - 0.4).abs() < 1e-9);
        assert!(score <= AI_SCORE_THRESHOLD);
        assert!((score.max(1.0 - score) - 0.6).abs() < 1e-9);
    }
}
