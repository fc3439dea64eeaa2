use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, warn};
use moka::future::Cache;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::aggregate::DateRange;
use crate::error::FetchError;
use crate::fetchers::ProxyClient;
use crate::registry::ChainRecord;

/// Daily new-transactions line endpoint.
const TXNS_PATH: &str = "/api/v1/lines/newTxns";

/// Daily active-accounts line endpoint.
const ACCOUNTS_PATH: &str = "/api/v1/lines/activeAccounts";

/// TTL for the failed-host negative cache. Explorers that errored are not
/// retried within this window; the TTL ensures a recovered host is picked
/// up again by a later refresh cycle.
const FAILED_HOST_TTL: Duration = Duration::from_secs(3600);

/// One day of a chain's transactions series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnPoint {
    pub date: NaiveDate,
    pub value: u64,
    /// Provisional data for days the explorer has not finalized. Excluded
    /// from authoritative totals, kept for estimate display.
    pub is_approximate: bool,
}

/// One day of a chain's active-accounts series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPoint {
    pub date: NaiveDate,
    pub value: u64,
}

#[derive(Debug, Deserialize)]
struct LineResponse {
    #[serde(default)]
    chart: Vec<LinePoint>,
}

#[derive(Debug, Deserialize)]
struct LinePoint {
    date: String,
    /// Explorers serve counts as strings, some as numbers. Decoded leniently
    /// and parsed in [`parse_count`].
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default, rename = "isApproximate")]
    is_approximate: bool,
}

/// Per-chain metric fetcher for the block-explorer line endpoints.
///
/// One failing chain never fails the batch: its series comes back empty and
/// the failure is logged. Hosts that errored recently are skipped via a
/// TTL'd negative cache so a 40-chain refresh does not hammer dead
/// explorers once per metric.
pub struct ExplorerFetcher {
    proxy: Arc<ProxyClient>,
    failed_hosts: Cache<String, ()>,
}

impl ExplorerFetcher {
    pub fn new(proxy: Arc<ProxyClient>) -> Self {
        let failed_hosts = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(FAILED_HOST_TTL)
            .build();

        Self {
            proxy,
            failed_hosts,
        }
    }

    /// Daily new transactions for every chain, launched concurrently and
    /// joined once all settle. Every chain gets an entry; failed chains get
    /// an empty series.
    pub async fn fetch_all_transactions(
        &self,
        chains: &[ChainRecord],
        today: NaiveDate,
    ) -> FxHashMap<String, Vec<TxnPoint>> {
        let tasks = chains.iter().map(|chain| async move {
            let series = self.fetch_transactions(chain, today).await;
            (chain.name.clone(), series)
        });

        join_all(tasks).await.into_iter().collect()
    }

    /// Daily active accounts for every chain; same failure policy as
    /// [`Self::fetch_all_transactions`].
    pub async fn fetch_all_active_accounts(
        &self,
        chains: &[ChainRecord],
        today: NaiveDate,
    ) -> FxHashMap<String, Vec<AccountPoint>> {
        let tasks = chains.iter().map(|chain| async move {
            let series = self.fetch_active_accounts(chain, today).await;
            (chain.name.clone(), series)
        });

        join_all(tasks).await.into_iter().collect()
    }

    /// Daily new transactions for one chain over `[launch_date, today]`.
    pub async fn fetch_transactions(&self, chain: &ChainRecord, today: NaiveDate) -> Vec<TxnPoint> {
        let range = DateRange::for_chain(chain, today);
        let points = match self.fetch_line(chain, TXNS_PATH, &[], &range).await {
            Ok(points) => points,
            Err(e) => {
                self.record_failure(chain, "transactions", &e).await;
                return Vec::new();
            },
        };

        points
            .iter()
            .filter_map(|point| {
                let date = parse_point_date(chain, &point.date)?;
                Some(TxnPoint {
                    date,
                    value: parse_count(chain, &point.date, &point.value),
                    is_approximate: point.is_approximate,
                })
            })
            .collect()
    }

    /// Daily active accounts for one chain over `[launch_date, today]`.
    pub async fn fetch_active_accounts(
        &self,
        chain: &ChainRecord,
        today: NaiveDate,
    ) -> Vec<AccountPoint> {
        let range = DateRange::for_chain(chain, today);
        let resolution = [("resolution", "DAY")];
        let points = match self.fetch_line(chain, ACCOUNTS_PATH, &resolution, &range).await {
            Ok(points) => points,
            Err(e) => {
                self.record_failure(chain, "active accounts", &e).await;
                return Vec::new();
            },
        };

        points
            .iter()
            .filter_map(|point| {
                let date = parse_point_date(chain, &point.date)?;
                Some(AccountPoint {
                    date,
                    value: parse_count(chain, &point.date, &point.value),
                })
            })
            .collect()
    }

    async fn fetch_line(
        &self,
        chain: &ChainRecord,
        path: &str,
        extra_query: &[(&str, &str)],
        range: &DateRange,
    ) -> Result<Vec<LinePoint>> {
        let base = Url::parse(chain.explorer_base())
            .with_context(|| format!("Invalid explorer URL {:?}", chain.explorer_url))?;
        let host = base.host_str().unwrap_or(chain.explorer_base()).to_string();

        if self.failed_hosts.contains_key(&host) {
            debug!(
                "Skipping {} for {}: explorer {} failed recently",
                path, chain.name, host
            );
            return Ok(Vec::new());
        }

        let mut target = Url::parse(&format!("{}{}", chain.explorer_base(), path))
            .with_context(|| format!("Invalid explorer URL {:?}", chain.explorer_url))?;
        {
            let mut query = target.query_pairs_mut();
            query.append_pair("from", &range.from.format("%Y-%m-%d").to_string());
            query.append_pair("to", &range.to.format("%Y-%m-%d").to_string());
            for (key, value) in extra_query {
                query.append_pair(key, value);
            }
        }

        let response: LineResponse = self.proxy.get_json(target.as_str()).await?;
        Ok(response.chart)
    }

    async fn record_failure(&self, chain: &ChainRecord, metric: &str, error: &anyhow::Error) {
        let failure = FetchError::ChainFetchFailed {
            chain: chain.name.clone(),
            reason: format!("{error:#}"),
        };
        warn!("{failure} ({metric} series will be empty)");

        if let Ok(base) = Url::parse(chain.explorer_base()) {
            if let Some(host) = base.host_str() {
                self.failed_hosts.insert(host.to_string(), ()).await;
            }
        }
    }
}

fn parse_point_date(chain: &ChainRecord, raw: &str) -> Option<NaiveDate> {
    match raw.parse() {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Skipping point with unparseable date {:?} for {}", raw, chain.name);
            None
        },
    }
}

/// Parse a raw chart value into a count. Explorers serve counts as strings
/// or numbers; anything else coerces to 0 with a logged warning rather than
/// failing the series.
fn parse_count(chain: &ChainRecord, date: &str, raw: &serde_json::Value) -> u64 {
    let parsed = match raw {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        },
        _ => None,
    };

    match parsed {
        Some(value) => value,
        None => {
            let malformed = FetchError::MalformedPoint {
                chain: chain.name.clone(),
                key: date.to_string(),
                raw: raw.to_string(),
            };
            warn!("{malformed}, coercing to 0");
            0
        },
    }
}
