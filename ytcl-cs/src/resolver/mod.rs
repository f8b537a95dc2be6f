//! Tiered channel classification resolution
//!
//! Priority order, first match wins:
//! 1. Manual override (block → AI-generated, allow → human-created)
//! 2. Consensus store verdict, behind a TTL cache
//! 3. Bundled fallback dataset
//! 4. Unknown
//!
//! The chain is an explicit sequence of lookup tiers, each answering
//! found/not-found. Reads fail open: a tier that errors logs a warning and
//! falls through, and `should_hide` maps Unknown to "not hidden" - a
//! classification outage must never mass-hide content.

pub mod cache;
pub mod fallback;
pub mod overrides;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use ytcl_common::{ident, Classification, HidePreferences, Result};

use crate::db::{channels, predictions};

pub use cache::{Clock, SystemClock, TtlCache};
pub use fallback::StaticFallbackDataset;
pub use overrides::{ManualOverride, OverrideAction, OverrideStore};

/// Cache of consensus lookups; None records "no prediction found" so a miss
/// is not re-queried until the TTL lapses
pub type ResolverCache = TtlCache<Option<Classification>>;

/// Default TTL for cached consensus lookups
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Seam over the consensus store's newest-verdict lookup
#[async_trait]
pub trait ConsensusSource: Send + Sync {
    /// Newest consensus classification for a lookup key (normalized
    /// identifier or channel ID), or None when the channel has no
    /// prediction yet
    async fn latest_classification(&self, key: &str) -> Result<Option<Classification>>;
}

/// Consensus source backed by the channels + predictions tables
pub struct DbConsensusSource {
    db: SqlitePool,
}

impl DbConsensusSource {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConsensusSource for DbConsensusSource {
    async fn latest_classification(&self, key: &str) -> Result<Option<Classification>> {
        let channel = match channels::get_by_identifier_or_handle(&self.db, key).await? {
            Some(channel) => channel,
            None => return Ok(None),
        };

        let prediction = predictions::latest_for_channel(&self.db, &channel.id).await?;
        Ok(prediction.map(|p| Classification::from_is_ai(p.is_ai)))
    }
}

/// Tiered classification lookup with TTL caching and explicit invalidation
pub struct ClassificationResolver {
    overrides: Arc<OverrideStore>,
    consensus: Arc<dyn ConsensusSource>,
    fallback: StaticFallbackDataset,
    cache: Arc<ResolverCache>,
}

impl ClassificationResolver {
    /// Production wiring: database-backed consensus source and overrides,
    /// wall-clock cache expiry
    pub fn new(db: SqlitePool, fallback: StaticFallbackDataset, cache_ttl: Duration) -> Self {
        let cache: Arc<ResolverCache> =
            Arc::new(TtlCache::new(cache_ttl, Arc::new(SystemClock)));
        let overrides = Arc::new(OverrideStore::new(db.clone(), cache.clone()));
        let consensus: Arc<dyn ConsensusSource> = Arc::new(DbConsensusSource::new(db));

        Self {
            overrides,
            consensus,
            fallback,
            cache,
        }
    }

    /// Explicit wiring, used by tests to inject sources and clocks
    pub fn with_parts(
        overrides: Arc<OverrideStore>,
        consensus: Arc<dyn ConsensusSource>,
        fallback: StaticFallbackDataset,
        cache: Arc<ResolverCache>,
    ) -> Self {
        Self {
            overrides,
            consensus,
            fallback,
            cache,
        }
    }

    /// The override store serving tier 1; override mutations go through
    /// here so they hit the right cache
    pub fn overrides(&self) -> &Arc<OverrideStore> {
        &self.overrides
    }

    /// Classify a channel
    ///
    /// `channel_id`, when the caller has one, takes precedence as the
    /// lookup key; otherwise the normalized identifier is the key. Returns
    /// Unknown when no tier produces a verdict.
    pub async fn resolve(&self, identifier: &str, channel_id: Option<&str>) -> Classification {
        let normalized = ident::normalize(identifier);
        let key = channel_id
            .map(ident::normalize)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| normalized.clone());

        if key.is_empty() {
            return Classification::Unknown;
        }

        // Tier 1: manual override
        match self.overrides.get(&key).await {
            Ok(Some(OverrideAction::Block)) => return Classification::AiGenerated,
            Ok(Some(OverrideAction::Allow)) => return Classification::HumanCreated,
            Ok(None) => {}
            Err(e) => warn!("Override lookup failed for {}: {}", key, e),
        }

        // Tier 2: consensus verdict, through the TTL cache
        match self.cached_consensus(&key).await {
            Ok(Some(classification)) => return classification,
            Ok(None) => {}
            Err(e) => warn!("Consensus lookup failed for {}: {}", key, e),
        }

        // Tier 3: bundled fallback dataset
        if let Some(classification) = self.fallback.lookup(&normalized) {
            return classification;
        }

        Classification::Unknown
    }

    /// Whether content from this channel should be hidden
    ///
    /// Never errors; every failure path resolves to Unknown, which is never
    /// hidden.
    pub async fn should_hide(
        &self,
        identifier: &str,
        prefs: HidePreferences,
        channel_id: Option<&str>,
    ) -> bool {
        let classification = self.resolve(identifier, channel_id).await;
        prefs.hides(classification)
    }

    /// Drop the cache entry for one channel, or the whole cache
    ///
    /// Called after override mutations and after every consensus
    /// recomputation for the channel.
    pub fn invalidate(&self, channel_id: Option<&str>) {
        match channel_id {
            Some(id) => {
                let key = ident::normalize(id);
                if !key.is_empty() {
                    self.cache.invalidate(Some(&key));
                }
            }
            None => self.cache.invalidate(None),
        }
    }

    async fn cached_consensus(&self, key: &str) -> Result<Option<Classification>> {
        if let Some(cached) = self.cache.get(key) {
            return Ok(cached);
        }

        // Errors propagate uncached so the next resolution retries the store
        let fetched = self.consensus.latest_classification(key).await?;
        self.cache.insert(key.to_string(), fetched);
        Ok(fetched)
    }
}
