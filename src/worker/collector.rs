use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{Days, Utc};
use log::info;
use rustc_hash::FxHashMap;

use crate::aggregate::{
    aggregate_counts_by_date, aggregate_transactions_by_date, chain_totals, cross_tab,
    final_totals, latest_tps, latest_tvl, percentage_increase, range_total, rekey_monthly,
    rekey_weekly, tally_by, top_n, DateRange,
};
use crate::error::FetchError;
use crate::fetchers::{AnalyticsFetcher, ExplorerFetcher, TxnPoint};
use crate::registry::{ChainRecord, RegistrySource};
use crate::worker::datasets::{
    Dataset, EcosystemBundle, RaasBundle, RaasProviderStats, TpsBundle,
};

/// Ranking sizes per view: the overview table shows 10, the TVL panel 7,
/// the TPS panel 6.
const TOP_CHAINS_BY_TXNS: usize = 10;
const TOP_CHAINS_BY_TVL: usize = 7;
const TOP_CHAINS_BY_TPS: usize = 6;

/// Runs one full collection cycle per dataset: registry fetch, concurrent
/// per-chain metric fan-out, aggregation into the bundle.
///
/// A registry failure is fatal to the cycle. Per-chain failures were already
/// absorbed by the fetchers; the only other whole-dataset failure is every
/// chain coming back empty at once.
pub struct EcosystemCollector {
    registry: RegistrySource,
    explorer: ExplorerFetcher,
    analytics: AnalyticsFetcher,
}

impl EcosystemCollector {
    pub fn new(
        registry: RegistrySource,
        explorer: ExplorerFetcher,
        analytics: AnalyticsFetcher,
    ) -> Self {
        Self {
            registry,
            explorer,
            analytics,
        }
    }

    /// Build the full ecosystem overview bundle.
    pub async fn collect_ecosystem(&self) -> Result<EcosystemBundle, FetchError> {
        let start = Instant::now();

        let chains = self.registry.fetch_chain_registry().await?;
        let mainnet: Vec<ChainRecord> =
            chains.iter().filter(|chain| chain.is_mainnet()).cloned().collect();
        let today = Utc::now().date_naive();

        // Independent metrics fetch concurrently; each already fans out per
        // chain internally.
        let (txns, accounts, tvl) = tokio::join!(
            self.explorer.fetch_all_transactions(&mainnet, today),
            self.explorer.fetch_all_active_accounts(&mainnet, today),
            self.analytics.fetch_all_tvl(&mainnet),
        );

        if !mainnet.is_empty()
            && txns.values().all(|series| series.is_empty())
            && accounts.values().all(|series| series.is_empty())
            && tvl.values().all(|series| series.is_empty())
        {
            return Err(FetchError::DatasetEmpty(Dataset::Ecosystem.id()));
        }

        let range = DateRange::spanning(&mainnet, today);
        let daily_transactions = aggregate_transactions_by_date(&txns, &range);
        let daily_final = final_totals(&daily_transactions);
        let weekly_transactions = rekey_weekly(&daily_final);
        let monthly_transactions = rekey_monthly(&daily_final);
        let daily_active_accounts = aggregate_counts_by_date(&accounts, &range);
        let tvl_by_chain = latest_tvl(&tvl);

        // Ranking inputs walk the registry order so that ties break the same
        // way on every refresh.
        let txn_totals = chain_totals(&txns);
        let txn_ranking_input: Vec<(String, f64)> = mainnet
            .iter()
            .map(|chain| {
                let total = txn_totals.get(&chain.name).copied().unwrap_or(0);
                (chain.name.clone(), total as f64)
            })
            .collect();
        let top_chains_by_transactions = top_n(&txn_ranking_input, TOP_CHAINS_BY_TXNS, None);

        let tvl_ranking_input: Vec<(String, f64)> = mainnet
            .iter()
            .map(|chain| {
                let total = tvl_by_chain
                    .get(&chain.name)
                    .map(|breakdown| breakdown.total)
                    .unwrap_or(0.0);
                (chain.name.clone(), total)
            })
            .collect();
        let top_chains_by_tvl = top_n(&tvl_ranking_input, TOP_CHAINS_BY_TVL, None);

        let last_week = DateRange::new(today - Days::new(6), today);
        let week_before = DateRange::new(today - Days::new(13), today - Days::new(7));
        let seven_day_growth = percentage_increase(
            range_total(&daily_transactions, &last_week) as f64,
            range_total(&daily_transactions, &week_before) as f64,
        );

        // Category tables cover the whole registry, announced chains included.
        let verticals = tally_by(&chains, |chain| chain.vertical.clone());
        let frameworks = tally_by(&chains, |chain| chain.framework.clone());
        let data_availability = tally_by(&chains, |chain| chain.data_availability.clone());
        let layers = tally_by(&chains, |chain| chain.layer.as_str().to_string());
        let launch_quarters =
            tally_by(&chains, |chain| chain.launch_quarter().unwrap_or_default());
        let vertical_frameworks = cross_tab(
            &chains,
            |chain| chain.vertical.clone(),
            |chain| chain.framework.clone(),
        );

        info!(
            "Collected ecosystem dataset in {:?} ({} chains, {} mainnet)",
            start.elapsed(),
            chains.len(),
            mainnet.len()
        );

        Ok(EcosystemBundle {
            chains,
            daily_transactions,
            weekly_transactions,
            monthly_transactions,
            daily_active_accounts,
            tvl_by_chain,
            top_chains_by_transactions,
            top_chains_by_tvl,
            seven_day_growth,
            verticals,
            frameworks,
            data_availability,
            layers,
            launch_quarters,
            vertical_frameworks,
        })
    }

    /// Build the TPS bundle.
    pub async fn collect_tps(&self) -> Result<TpsBundle, FetchError> {
        let start = Instant::now();

        let chains = self.registry.fetch_chain_registry().await?;
        let mainnet: Vec<ChainRecord> =
            chains.iter().filter(|chain| chain.is_mainnet()).cloned().collect();

        let tps = self.analytics.fetch_all_tps(&mainnet).await;

        if !mainnet.is_empty() && tps.values().all(|series| series.is_empty()) {
            return Err(FetchError::DatasetEmpty(Dataset::Tps.id()));
        }

        let latest = latest_tps(&tps);
        // Only chains actually reporting a rate enter the ranking; a chain
        // unlisted on the analytics host is absence, not a zero rate.
        let ranking_input: Vec<(String, f64)> = mainnet
            .iter()
            .filter_map(|chain| latest.get(&chain.name).map(|rate| (chain.name.clone(), *rate)))
            .collect();
        let top_chains_by_tps = top_n(&ranking_input, TOP_CHAINS_BY_TPS, None);

        info!(
            "Collected TPS dataset in {:?} ({} chains reporting)",
            start.elapsed(),
            ranking_input.len()
        );

        Ok(TpsBundle {
            tps_by_chain: tps.into_iter().collect(),
            top_chains_by_tps,
        })
    }

    /// Build the per-RaaS-provider bundle. Transactions are fetched once for
    /// the whole registry and sliced per provider, not refetched per page.
    pub async fn collect_raas_pages(&self) -> Result<RaasBundle, FetchError> {
        let start = Instant::now();

        let chains = self.registry.fetch_chain_registry().await?;
        let mainnet: Vec<ChainRecord> =
            chains.iter().filter(|chain| chain.is_mainnet()).cloned().collect();
        let today = Utc::now().date_naive();

        let txns = self.explorer.fetch_all_transactions(&mainnet, today).await;

        if !mainnet.is_empty() && txns.values().all(|series| series.is_empty()) {
            return Err(FetchError::DatasetEmpty(Dataset::RaasPages.id()));
        }

        let txn_totals = chain_totals(&txns);

        let providers = crate::aggregate::group_by(&chains, |chain| chain.raas_provider.clone())
            .into_iter()
            .map(|(provider, members)| {
                let owned: Vec<ChainRecord> =
                    members.iter().map(|&chain| chain.clone()).collect();
                let stats = provider_stats(&owned, &txns, &txn_totals, today);
                (provider, stats)
            })
            .collect();

        info!("Collected RaaS pages dataset in {:?}", start.elapsed());

        Ok(RaasBundle { providers })
    }
}

fn provider_stats(
    members: &[ChainRecord],
    txns: &FxHashMap<String, Vec<TxnPoint>>,
    txn_totals: &FxHashMap<String, u64>,
    today: chrono::NaiveDate,
) -> RaasProviderStats {
    let mainnet_members: Vec<ChainRecord> =
        members.iter().filter(|chain| chain.is_mainnet()).cloned().collect();

    let weekly_transactions = if mainnet_members.is_empty() {
        BTreeMap::new()
    } else {
        let provider_series: FxHashMap<String, Vec<TxnPoint>> = mainnet_members
            .iter()
            .filter_map(|chain| {
                txns.get(&chain.name)
                    .map(|series| (chain.name.clone(), series.clone()))
            })
            .collect();
        let range = DateRange::spanning(&mainnet_members, today);
        let daily = aggregate_transactions_by_date(&provider_series, &range);
        rekey_weekly(&final_totals(&daily))
    };

    let total_transactions = members
        .iter()
        .map(|chain| txn_totals.get(&chain.name).copied().unwrap_or(0))
        .sum();

    RaasProviderStats {
        chains: members.iter().map(|chain| chain.name.clone()).collect(),
        mainnet_count: mainnet_members.len(),
        total_transactions,
        weekly_transactions,
        verticals: tally_by(members, |chain| chain.vertical.clone()),
        data_availability: tally_by(members, |chain| chain.data_availability.clone()),
    }
}
