//! TTL cache in front of variant metadata lookups.
//!
//! Variant metadata (units per case, display name) changes rarely but is
//! consulted on every scan, so it sits behind a 5-minute in-memory cache.
//! The cache is owned by the engine that created it; nothing here is global.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use scantrace_core::VariantId;

use crate::models::VariantMeta;
use crate::scan::store::{StoreError, VariantStore};

/// Read-through cache over a [`VariantStore`].
#[derive(Clone)]
pub struct VariantMetaCache {
    store: Arc<dyn VariantStore>,
    cache: Cache<VariantId, VariantMeta>,
}

impl VariantMetaCache {
    /// Default time-to-live for cached metadata.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// Create a cache over the given store with the given TTL.
    #[must_use]
    pub fn new(store: Arc<dyn VariantStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();

        Self { store, cache }
    }

    /// Resolve metadata for the given variants.
    ///
    /// Cached entries are served directly; only the uncached remainder goes
    /// to the store, and whatever comes back is cached for next time.
    /// Variants the store does not know stay absent from the result.
    ///
    /// # Errors
    ///
    /// Returns the store error when the miss fetch fails.
    pub async fn resolve(
        &self,
        ids: &[VariantId],
    ) -> Result<HashMap<VariantId, VariantMeta>, StoreError> {
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut missing: Vec<VariantId> = Vec::new();

        for &id in ids {
            if resolved.contains_key(&id) {
                continue;
            }
            if let Some(meta) = self.cache.get(&id).await {
                resolved.insert(id, meta);
            } else if !missing.contains(&id) {
                missing.push(id);
            }
        }

        if !missing.is_empty() {
            let fetched = self.store.fetch_meta(&missing).await?;
            for (id, meta) in fetched {
                self.cache.insert(id, meta.clone()).await;
                resolved.insert(id, meta);
            }
        }

        Ok(resolved)
    }
}
