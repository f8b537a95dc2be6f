//! Manual channel overrides
//!
//! Users can force a channel to always hide (block) or never hide (allow),
//! superseding any automated classification. The whole override set is one
//! JSON map under a single settings key, mirrored by an in-memory index.
//! The index is revalidated against the settings row's write stamp on every
//! access, so a write from another handle (or another process sharing the
//! database) is picked up on the next read.

use crate::resolver::ResolverCache;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use ytcl_common::db::settings::{get_setting, set_setting, setting_updated_at};
use ytcl_common::{ident, time, Error, Result};

/// Settings key holding the override map
pub const OVERRIDES_SETTING_KEY: &str = "manual_overrides";

/// What an override forces for the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideAction {
    /// Always hide, regardless of classification
    Block,
    /// Never hide, regardless of classification
    Allow,
}

/// A single manual override record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualOverride {
    /// Normalized identifier the override is keyed by
    pub identifier: String,
    /// Display handle, if the caller had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub action: OverrideAction,
    /// Epoch milliseconds when the override was set
    pub timestamp: i64,
}

struct LoadedIndex {
    map: HashMap<String, ManualOverride>,
    /// settings.updated_at of the row the map was loaded from
    stamp: Option<String>,
}

/// Persisted per-user block/allow decisions with an in-memory index
pub struct OverrideStore {
    db: SqlitePool,
    cache: Arc<ResolverCache>,
    index: Mutex<Option<LoadedIndex>>,
}

impl OverrideStore {
    pub fn new(db: SqlitePool, cache: Arc<ResolverCache>) -> Self {
        Self {
            db,
            cache,
            index: Mutex::new(None),
        }
    }

    /// Current override map, reloading when the persisted row changed
    async fn load(&self) -> Result<HashMap<String, ManualOverride>> {
        let stamp = setting_updated_at(&self.db, OVERRIDES_SETTING_KEY).await?;

        {
            let guard = self.index.lock().unwrap();
            if let Some(index) = guard.as_ref() {
                if index.stamp == stamp {
                    return Ok(index.map.clone());
                }
            }
        }

        let map = match get_setting::<String>(&self.db, OVERRIDES_SETTING_KEY).await? {
            Some(raw) => match serde_json::from_str::<HashMap<String, ManualOverride>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Stored override map is unreadable, starting empty: {}", e);
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };

        let mut guard = self.index.lock().unwrap();
        *guard = Some(LoadedIndex {
            map: map.clone(),
            stamp,
        });

        Ok(map)
    }

    /// Persist a map and drop the index so the next access reloads with the
    /// fresh write stamp
    async fn save(&self, map: &HashMap<String, ManualOverride>) -> Result<()> {
        let raw = serde_json::to_string(map)
            .map_err(|e| Error::Internal(format!("Failed to encode overrides: {}", e)))?;
        set_setting(&self.db, OVERRIDES_SETTING_KEY, raw).await?;

        let mut guard = self.index.lock().unwrap();
        *guard = None;

        Ok(())
    }

    /// Set (or replace) the override for a channel
    pub async fn set(
        &self,
        identifier: &str,
        action: OverrideAction,
        handle: Option<&str>,
    ) -> Result<()> {
        let key = ident::normalize(identifier);
        if key.is_empty() {
            return Err(Error::Validation(format!(
                "unusable override identifier: {:?}",
                identifier
            )));
        }

        let mut map = self.load().await?;
        map.insert(
            key.clone(),
            ManualOverride {
                identifier: key.clone(),
                handle: handle.map(|h| h.to_string()),
                action,
                timestamp: time::now_millis(),
            },
        );
        self.save(&map).await?;

        self.cache.invalidate(Some(&key));
        info!("Set override for {}: {:?}", key, action);

        Ok(())
    }

    /// Override action for a channel, if any
    pub async fn get(&self, identifier: &str) -> Result<Option<OverrideAction>> {
        Ok(self.get_record(identifier).await?.map(|o| o.action))
    }

    /// Full override record for a channel, if any
    pub async fn get_record(&self, identifier: &str) -> Result<Option<ManualOverride>> {
        let key = ident::normalize(identifier);
        if key.is_empty() {
            return Ok(None);
        }

        let map = self.load().await?;
        Ok(map.get(&key).cloned())
    }

    /// Remove the override for a channel; no-op when none exists
    pub async fn remove(&self, identifier: &str) -> Result<()> {
        let key = ident::normalize(identifier);
        if key.is_empty() {
            return Ok(());
        }

        let mut map = self.load().await?;
        if map.remove(&key).is_some() {
            self.save(&map).await?;
            self.cache.invalidate(Some(&key));
            info!("Removed override for {}", key);
        }

        Ok(())
    }

    /// All override records (ordering unspecified)
    pub async fn list(&self) -> Result<Vec<ManualOverride>> {
        let map = self.load().await?;
        Ok(map.into_values().collect())
    }

    /// Only blocked channels
    pub async fn list_blocked(&self) -> Result<Vec<ManualOverride>> {
        let mut all = self.list().await?;
        all.retain(|o| o.action == OverrideAction::Block);
        Ok(all)
    }

    /// Only allowed (whitelisted) channels
    pub async fn list_allowed(&self) -> Result<Vec<ManualOverride>> {
        let mut all = self.list().await?;
        all.retain(|o| o.action == OverrideAction::Allow);
        Ok(all)
    }

    /// Remove every override
    pub async fn clear_all(&self) -> Result<()> {
        self.save(&HashMap::new()).await?;
        self.cache.invalidate(None);
        info!("Cleared all manual overrides");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::cache::{SystemClock, TtlCache};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    async fn setup_store() -> OverrideStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        ytcl_common::db::init::create_settings_table(&pool).await.unwrap();

        let cache = Arc::new(TtlCache::new(
            Duration::from_secs(300),
            Arc::new(SystemClock),
        ));
        OverrideStore::new(pool, cache)
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = setup_store().await;

        assert_eq!(store.get("somechannel").await.unwrap(), None);

        store
            .set("@SomeChannel", OverrideAction::Block, Some("@SomeChannel"))
            .await
            .unwrap();
        // Lookup works in any raw form of the same identifier
        assert_eq!(
            store.get("/@somechannel").await.unwrap(),
            Some(OverrideAction::Block)
        );

        store.remove("somechannel").await.unwrap();
        assert_eq!(store.get("somechannel").await.unwrap(), None);

        // Removing again is a no-op
        store.remove("somechannel").await.unwrap();
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = setup_store().await;

        store.set("somechannel", OverrideAction::Block, None).await.unwrap();
        store.set("somechannel", OverrideAction::Allow, None).await.unwrap();

        assert_eq!(
            store.get("somechannel").await.unwrap(),
            Some(OverrideAction::Allow)
        );
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = setup_store().await;

        store.set("blocked-1", OverrideAction::Block, None).await.unwrap();
        store.set("blocked-2", OverrideAction::Block, None).await.unwrap();
        store.set("allowed-1", OverrideAction::Allow, None).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 3);
        assert_eq!(store.list_blocked().await.unwrap().len(), 2);
        assert_eq!(store.list_allowed().await.unwrap().len(), 1);

        store.clear_all().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_external_mutation_detected() {
        let store = setup_store().await;

        store.set("somechannel", OverrideAction::Block, None).await.unwrap();
        // Warm the index
        assert!(store.get("somechannel").await.unwrap().is_some());

        // Another writer replaces the persisted map behind the store's back
        let other = ManualOverride {
            identifier: "otherchannel".to_string(),
            handle: None,
            action: OverrideAction::Allow,
            timestamp: 0,
        };
        let mut replacement = HashMap::new();
        replacement.insert("otherchannel".to_string(), other);
        tokio::time::sleep(Duration::from_millis(5)).await;
        set_setting(
            &store.db,
            OVERRIDES_SETTING_KEY,
            serde_json::to_string(&replacement).unwrap(),
        )
        .await
        .unwrap();

        // The stale index is dropped on next access
        assert_eq!(store.get("somechannel").await.unwrap(), None);
        assert_eq!(
            store.get("otherchannel").await.unwrap(),
            Some(OverrideAction::Allow)
        );
    }

    #[tokio::test]
    async fn test_corrupt_persisted_map_degrades_to_empty() {
        let store = setup_store().await;

        set_setting(&store.db, OVERRIDES_SETTING_KEY, "not json".to_string())
            .await
            .unwrap();

        assert_eq!(store.get("somechannel").await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cache_entry() {
        let store = setup_store().await;

        store.cache.insert("somechannel".to_string(), None);
        assert_eq!(store.cache.len(), 1);

        store.set("@SomeChannel", OverrideAction::Allow, None).await.unwrap();
        assert!(store.cache.is_empty());
    }
}
