use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::cache::CacheStore;
use crate::error::FetchError;
use crate::worker::collector::EcosystemCollector;
use crate::worker::datasets::{Dataset, EcosystemBundle, RaasBundle, TpsBundle};

/// Freshness gate between consumers and the collector.
///
/// Each dataset moves through `EMPTY -> FETCHING -> READY(fresh) ->
/// READY(stale) -> FETCHING -> ...`: freshness decays purely by wall clock
/// against the dataset's TTL, and a refetch is triggered only by a consumer
/// read observing a stale or absent entry. A cache that cannot be read or
/// written degrades to refetching every time, nothing worse.
///
/// One refresh lock per dataset keeps concurrent stale readers from issuing
/// duplicate collection cycles; whoever loses the race re-checks the store
/// and finds the fresh entry the winner just wrote.
pub struct DatasetManager {
    store: Arc<CacheStore>,
    collector: Arc<EcosystemCollector>,
    ecosystem_lock: Mutex<()>,
    tps_lock: Mutex<()>,
    raas_lock: Mutex<()>,
}

impl DatasetManager {
    pub fn new(store: Arc<CacheStore>, collector: Arc<EcosystemCollector>) -> Self {
        Self {
            store,
            collector,
            ecosystem_lock: Mutex::new(()),
            tps_lock: Mutex::new(()),
            raas_lock: Mutex::new(()),
        }
    }

    /// The ecosystem overview bundle, from cache when fresh.
    pub async fn ecosystem(&self) -> Result<EcosystemBundle, FetchError> {
        if let Some(bundle) = self.load_fresh(Dataset::Ecosystem).await {
            return Ok(bundle);
        }

        let _guard = self.ecosystem_lock.lock().await;
        if let Some(bundle) = self.load_fresh(Dataset::Ecosystem).await {
            return Ok(bundle);
        }

        info!("Refreshing dataset {}", Dataset::Ecosystem.id());
        let bundle = self.collector.collect_ecosystem().await?;
        self.store_bundle(Dataset::Ecosystem, &bundle).await;
        Ok(bundle)
    }

    /// The TPS bundle, from cache when fresh.
    pub async fn tps(&self) -> Result<TpsBundle, FetchError> {
        if let Some(bundle) = self.load_fresh(Dataset::Tps).await {
            return Ok(bundle);
        }

        let _guard = self.tps_lock.lock().await;
        if let Some(bundle) = self.load_fresh(Dataset::Tps).await {
            return Ok(bundle);
        }

        info!("Refreshing dataset {}", Dataset::Tps.id());
        let bundle = self.collector.collect_tps().await?;
        self.store_bundle(Dataset::Tps, &bundle).await;
        Ok(bundle)
    }

    /// The per-provider bundle, from cache when fresh.
    pub async fn raas_pages(&self) -> Result<RaasBundle, FetchError> {
        if let Some(bundle) = self.load_fresh(Dataset::RaasPages).await {
            return Ok(bundle);
        }

        let _guard = self.raas_lock.lock().await;
        if let Some(bundle) = self.load_fresh(Dataset::RaasPages).await {
            return Ok(bundle);
        }

        info!("Refreshing dataset {}", Dataset::RaasPages.id());
        let bundle = self.collector.collect_raas_pages().await?;
        self.store_bundle(Dataset::RaasPages, &bundle).await;
        Ok(bundle)
    }

    /// Drop every cached dataset, forcing full refetches.
    pub async fn clear_cache(&self) -> Result<(), FetchError> {
        self.store.clear().await
    }

    async fn load_fresh<T: DeserializeOwned>(&self, dataset: Dataset) -> Option<T> {
        let entry = self.store.get(dataset.id()).await?;

        let now_ms = Utc::now().timestamp_millis();
        if !entry.is_fresh(dataset.ttl(), now_ms) {
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(bundle) => Some(bundle),
            Err(e) => {
                // An undecodable entry is from an older bundle layout;
                // refetching replaces it.
                warn!(
                    "Discarding undecodable cache entry {}: {}",
                    dataset.id(),
                    e
                );
                None
            },
        }
    }

    async fn store_bundle<T: Serialize>(&self, dataset: Dataset, bundle: &T) {
        if let Err(e) = self.store.save(dataset.id(), bundle).await {
            warn!("{e}, serving dataset without caching");
        }
    }
}
