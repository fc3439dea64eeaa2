use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use log::{debug, warn};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;
use crate::fetchers::ProxyClient;
use crate::registry::ChainRecord;

/// TVL chart endpoint on the analytics host.
const TVL_PATH: &str = "/api/trpc/tvl.chart";

/// Activity (TPS) chart endpoint on the analytics host.
const TPS_PATH: &str = "/api/trpc/activity.chart";

/// Raw TVL components arrive as fixed-point integers at 8 decimals.
const TVL_SCALE: f64 = 1e8;

/// Relative windows the analytics host accepts.
static VALID_RANGES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["max", "1 year", "180 days", "90 days", "30 days", "7 days"]
        .into_iter()
        .collect()
});

/// One point of a chain's TVL series, components in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TvlPoint {
    /// Unix seconds.
    pub timestamp: i64,
    pub native: f64,
    pub canonical: f64,
    pub external: f64,
}

impl TvlPoint {
    pub fn total(&self) -> f64 {
        self.native + self.canonical + self.external
    }
}

/// One point of a chain's TPS series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TpsPoint {
    /// Unix seconds.
    pub timestamp: i64,
    pub tps: f64,
}

#[derive(Debug, Deserialize)]
struct TrpcResponse {
    result: TrpcResult,
}

#[derive(Debug, Deserialize)]
struct TrpcResult {
    data: TrpcData,
}

#[derive(Debug, Deserialize)]
struct TrpcData {
    #[serde(default)]
    json: Vec<Vec<serde_json::Value>>,
}

/// Fetcher for the fixed analytics host serving TVL and TPS series.
///
/// Chains are addressed by their external project id and a relative window
/// rather than explicit date bounds. Chains without a project id are simply
/// not listed there and yield empty series; so do per-chain fetch failures.
pub struct AnalyticsFetcher {
    proxy: Arc<ProxyClient>,
    host: String,
    range: String,
}

impl AnalyticsFetcher {
    pub fn new(proxy: Arc<ProxyClient>, host: &str, range: &str) -> Self {
        let range = if VALID_RANGES.contains(range) {
            range.to_string()
        } else {
            warn!("Unknown analytics range {range:?}, falling back to \"max\"");
            "max".to_string()
        };

        Self {
            proxy,
            host: host.trim_end_matches('/').to_string(),
            range,
        }
    }

    /// TVL series for every chain, launched concurrently. Every chain gets
    /// an entry; unlisted or failed chains get an empty series.
    pub async fn fetch_all_tvl(
        &self,
        chains: &[ChainRecord],
    ) -> FxHashMap<String, Vec<TvlPoint>> {
        let tasks = chains.iter().map(|chain| async move {
            let series = self.fetch_tvl(chain).await;
            (chain.name.clone(), series)
        });

        join_all(tasks).await.into_iter().collect()
    }

    /// TPS series for every chain; same policy as [`Self::fetch_all_tvl`].
    pub async fn fetch_all_tps(
        &self,
        chains: &[ChainRecord],
    ) -> FxHashMap<String, Vec<TpsPoint>> {
        let tasks = chains.iter().map(|chain| async move {
            let series = self.fetch_tps(chain).await;
            (chain.name.clone(), series)
        });

        join_all(tasks).await.into_iter().collect()
    }

    /// TVL series for one chain. Components arrive as fixed-point integers
    /// and are scaled to USD.
    pub async fn fetch_tvl(&self, chain: &ChainRecord) -> Vec<TvlPoint> {
        let rows = match self.fetch_chart(chain, TVL_PATH).await {
            Ok(Some(rows)) => rows,
            Ok(None) => return Vec::new(),
            Err(e) => {
                let failure = FetchError::ChainFetchFailed {
                    chain: chain.name.clone(),
                    reason: format!("{e:#}"),
                };
                warn!("{failure} (TVL series will be empty)");
                return Vec::new();
            },
        };

        rows.iter()
            .filter_map(|row| {
                let timestamp = row.first().and_then(serde_json::Value::as_i64)?;
                Some(TvlPoint {
                    timestamp,
                    native: parse_scaled(chain, timestamp, row.get(1)),
                    canonical: parse_scaled(chain, timestamp, row.get(2)),
                    external: parse_scaled(chain, timestamp, row.get(3)),
                })
            })
            .collect()
    }

    /// TPS series for one chain.
    pub async fn fetch_tps(&self, chain: &ChainRecord) -> Vec<TpsPoint> {
        let rows = match self.fetch_chart(chain, TPS_PATH).await {
            Ok(Some(rows)) => rows,
            Ok(None) => return Vec::new(),
            Err(e) => {
                let failure = FetchError::ChainFetchFailed {
                    chain: chain.name.clone(),
                    reason: format!("{e:#}"),
                };
                warn!("{failure} (TPS series will be empty)");
                return Vec::new();
            },
        };

        rows.iter()
            .filter_map(|row| {
                let timestamp = row.first().and_then(serde_json::Value::as_i64)?;
                let tps = row.get(1).and_then(serde_json::Value::as_f64)?;
                Some(TpsPoint { timestamp, tps })
            })
            .collect()
    }

    /// Shared tRPC-style chart call. `Ok(None)` means the chain has no
    /// project id and is not listed on the analytics host.
    async fn fetch_chart(
        &self,
        chain: &ChainRecord,
        path: &str,
    ) -> Result<Option<Vec<Vec<serde_json::Value>>>> {
        let Some(project_id) = chain.project_id.as_deref() else {
            debug!("No analytics project id for {}, skipping {}", chain.name, path);
            return Ok(None);
        };

        let input = serde_json::json!({
            "json": {
                "filter": {"type": "projects", "projectIds": [project_id]},
                "range": self.range,
                "excludeAssociatedTokens": false,
            }
        });

        let mut target =
            Url::parse(&format!("{}{}", self.host, path)).context("Invalid analytics host")?;
        target
            .query_pairs_mut()
            .append_pair("input", &input.to_string());

        let response: TrpcResponse = self.proxy.get_json(target.as_str()).await?;
        Ok(Some(response.result.data.json))
    }
}

/// Parse one fixed-point TVL component. Missing or malformed components
/// coerce to 0 with a logged warning.
fn parse_scaled(chain: &ChainRecord, timestamp: i64, raw: Option<&serde_json::Value>) -> f64 {
    let parsed = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|f| f.is_finite() && *f >= 0.0),
        Some(serde_json::Value::String(s)) => {
            s.trim().parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0)
        },
        _ => None,
    };

    match parsed {
        Some(value) => value / TVL_SCALE,
        None => {
            let malformed = FetchError::MalformedPoint {
                chain: chain.name.clone(),
                key: timestamp.to_string(),
                raw: raw.map(|v| v.to_string()).unwrap_or_default(),
            };
            warn!("{malformed}, coercing to 0");
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trpc_response_decodes_nested_rows() {
        let body = r#"{
            "result": {"data": {"json": [
                [1712016000, 12340000000000, 5600000000000, 0],
                [1712102400, "12500000000000", 5700000000000, 100000000]
            ]}}
        }"#;
        let response: TrpcResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.result.data.json.len(), 2);
        assert_eq!(
            response.result.data.json[0][0],
            serde_json::json!(1712016000)
        );
    }

    #[test]
    fn test_tvl_components_scale_and_sum() {
        let chain = test_chain();
        let native = parse_scaled(&chain, 0, Some(&serde_json::json!(12340000000000u64)));
        assert_eq!(native, 123_400.0);

        // String-typed components parse too.
        let canonical = parse_scaled(&chain, 0, Some(&serde_json::json!("5600000000000")));
        assert_eq!(canonical, 56_000.0);

        let point = TvlPoint {
            timestamp: 0,
            native,
            canonical,
            external: 0.0,
        };
        assert_eq!(point.total(), 179_400.0);
    }

    #[test]
    fn test_malformed_tvl_component_coerces_to_zero() {
        let chain = test_chain();
        assert_eq!(parse_scaled(&chain, 0, Some(&serde_json::json!("oops"))), 0.0);
        assert_eq!(parse_scaled(&chain, 0, Some(&serde_json::Value::Null)), 0.0);
        assert_eq!(parse_scaled(&chain, 0, None), 0.0);
    }

    fn test_chain() -> ChainRecord {
        ChainRecord {
            name: "Testchain".to_string(),
            explorer_url: "https://explorer.testchain.io".to_string(),
            project_id: Some("testchain".to_string()),
            website: String::new(),
            raas_provider: String::new(),
            launch_date: None,
            vertical: String::new(),
            framework: String::new(),
            data_availability: String::new(),
            layer: crate::registry::Layer::Unknown,
            settlement: String::new(),
            logo_url: String::new(),
            status: "Mainnet".to_string(),
        }
    }
}
