use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{CategoryTally, CrossTabGroup, DailyTotal, RankedChain, TvlBreakdown};
use crate::fetchers::TpsPoint;
use crate::registry::ChainRecord;

/// The named dataset bundles the service maintains, one cache record each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Full ecosystem overview: registry, transaction/account aggregates,
    /// TVL, rankings, category breakdowns.
    Ecosystem,
    /// TPS series and ranking. Refreshed more often than the rest.
    Tps,
    /// Per-RaaS-provider rollups backing the provider pages.
    RaasPages,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Ecosystem, Dataset::Tps, Dataset::RaasPages];

    /// Cache record id.
    pub fn id(&self) -> &'static str {
        match self {
            Dataset::Ecosystem => "ecosystemData",
            Dataset::Tps => "tpsData",
            Dataset::RaasPages => "raasPageData",
        }
    }

    /// Freshness window. Overview data tolerates hours of lag; TPS is the
    /// closest thing to a live number on the dashboard.
    pub fn ttl(&self) -> Duration {
        match self {
            Dataset::Ecosystem => Duration::from_secs(6 * 3600),
            Dataset::Tps => Duration::from_secs(3600),
            Dataset::RaasPages => Duration::from_secs(6 * 3600),
        }
    }
}

/// Full ecosystem overview bundle.
///
/// Metric aggregates cover mainnet chains; category tallies cover every
/// listed chain so upcoming launches show up in the breakdown tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcosystemBundle {
    pub chains: Vec<ChainRecord>,
    pub daily_transactions: BTreeMap<NaiveDate, DailyTotal>,
    pub weekly_transactions: BTreeMap<String, u64>,
    pub monthly_transactions: BTreeMap<String, u64>,
    pub daily_active_accounts: BTreeMap<NaiveDate, u64>,
    pub tvl_by_chain: BTreeMap<String, TvlBreakdown>,
    pub top_chains_by_transactions: Vec<RankedChain>,
    pub top_chains_by_tvl: Vec<RankedChain>,
    /// Finalized transactions, trailing 7 days vs the 7 before. `None` when
    /// the earlier window has no data.
    pub seven_day_growth: Option<f64>,
    pub verticals: Vec<(String, CategoryTally)>,
    pub frameworks: Vec<(String, CategoryTally)>,
    pub data_availability: Vec<(String, CategoryTally)>,
    pub layers: Vec<(String, CategoryTally)>,
    pub launch_quarters: Vec<(String, CategoryTally)>,
    pub vertical_frameworks: Vec<(String, CrossTabGroup)>,
}

/// TPS bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TpsBundle {
    pub tps_by_chain: BTreeMap<String, Vec<TpsPoint>>,
    /// Chains ranked by latest TPS, with shares of the combined rate.
    pub top_chains_by_tps: Vec<RankedChain>,
}

/// Per-provider rollups backing the RaaS provider pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaasBundle {
    /// Providers in registry first-appearance order.
    pub providers: Vec<(String, RaasProviderStats)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaasProviderStats {
    /// Every chain listed under the provider, in registry order.
    pub chains: Vec<String>,
    pub mainnet_count: usize,
    pub total_transactions: u64,
    pub weekly_transactions: BTreeMap<String, u64>,
    pub verticals: Vec<(String, CategoryTally)>,
    pub data_availability: Vec<(String, CategoryTally)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_ids_are_distinct() {
        let ids: std::collections::HashSet<&str> =
            Dataset::ALL.iter().map(|dataset| dataset.id()).collect();
        assert_eq!(ids.len(), Dataset::ALL.len());
    }

    #[test]
    fn test_ttls_stay_within_the_expected_band() {
        for dataset in Dataset::ALL {
            let ttl = dataset.ttl();
            assert!(ttl >= Duration::from_secs(3600));
            assert!(ttl <= Duration::from_secs(6 * 3600));
        }
    }
}
