use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;

use crate::error::FetchError;
use crate::fetchers::ProxyClient;
use crate::registry::chain::{ChainRecord, Layer};

// Positional column contract of the registry sheet. The sheet has no header
// schema; the order below is fixed by the publisher.
const COL_NAME: usize = 0;
const COL_EXPLORER_URL: usize = 1;
const COL_PROJECT_ID: usize = 2;
const COL_WEBSITE: usize = 3;
const COL_RAAS: usize = 4;
// Columns 5-7 (year, quarter, month) duplicate the launch date and are ignored.
const COL_LAUNCH_DATE: usize = 8;
const COL_VERTICAL: usize = 9;
const COL_FRAMEWORK: usize = 10;
const COL_DA: usize = 11;
const COL_LAYER: usize = 12;
const COL_SETTLEMENT: usize = 13;
// Column 14 is unused.
const COL_LOGO_URL: usize = 15;
const COL_STATUS: usize = 16;

/// Launch dates appear in both ISO and US spreadsheet formats.
const LAUNCH_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct SheetResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Chain registry backed by a published spreadsheet.
///
/// Fetches the sheet through the proxy and maps positional rows into
/// validated [`ChainRecord`]s. Malformed rows are dropped with a warning;
/// an unreachable or empty sheet fails the whole fetch.
pub struct RegistrySource {
    proxy: Arc<ProxyClient>,
    sheet_url: String,
}

impl RegistrySource {
    pub fn new(proxy: Arc<ProxyClient>, sheet_url: String) -> Self {
        Self { proxy, sheet_url }
    }

    /// Fetch and parse the full chain registry.
    pub async fn fetch_chain_registry(&self) -> Result<Vec<ChainRecord>, FetchError> {
        let response: SheetResponse = self
            .proxy
            .get_json(&self.sheet_url)
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("{e:#}")))?;

        // First row is the human-readable header.
        let rows = response.values.iter().skip(1);

        let mut chains = Vec::new();
        let mut dropped = 0usize;
        for row in rows {
            match row_to_record(row) {
                Some(record) => chains.push(record),
                None => {
                    dropped += 1;
                    warn!(
                        "Dropping malformed registry row (missing name or explorer URL): {:?}",
                        row.first()
                    );
                },
            }
        }

        if chains.is_empty() {
            return Err(FetchError::SourceUnavailable(
                "registry sheet returned no usable rows".to_string(),
            ));
        }

        info!(
            "Loaded {} chains from registry ({} malformed rows dropped)",
            chains.len(),
            dropped
        );

        Ok(chains)
    }
}

/// Map one positional sheet row into a record.
///
/// This is the only place that knows the column order. Returns `None` when
/// the row is missing its name or explorer URL; every other field degrades
/// to an empty/absent value instead of rejecting the row.
fn row_to_record(row: &[String]) -> Option<ChainRecord> {
    let name = col(row, COL_NAME);
    let explorer_url = col(row, COL_EXPLORER_URL);
    if name.is_empty() || explorer_url.is_empty() {
        return None;
    }

    let project_id = match col(row, COL_PROJECT_ID) {
        id if id.is_empty() => None,
        id => Some(id.to_string()),
    };

    Some(ChainRecord {
        name: name.to_string(),
        explorer_url: explorer_url.to_string(),
        project_id,
        website: col(row, COL_WEBSITE).to_string(),
        raas_provider: col(row, COL_RAAS).to_string(),
        launch_date: parse_launch_date(col(row, COL_LAUNCH_DATE)),
        vertical: col(row, COL_VERTICAL).to_string(),
        framework: col(row, COL_FRAMEWORK).to_string(),
        data_availability: col(row, COL_DA).to_string(),
        layer: Layer::parse(col(row, COL_LAYER)),
        settlement: col(row, COL_SETTLEMENT).to_string(),
        logo_url: col(row, COL_LOGO_URL).to_string(),
        status: col(row, COL_STATUS).to_string(),
    })
}

/// Trimmed cell value, empty when the row is shorter than the column index.
fn col(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
}

fn parse_launch_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    LAUNCH_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn full_row() -> Vec<String> {
        row(&[
            "Proof of Play Apex",
            "https://explorer.apex.proofofplay.com/",
            "apex",
            "https://proofofplay.com",
            "Conduit",
            "2023",
            "Q4",
            "December",
            "2023-12-13",
            "Gaming",
            "Arbitrum Orbit",
            "DAC",
            "L3",
            "Arbitrum One",
            "",
            "https://logos.example.com/apex.png",
            "Mainnet",
        ])
    }

    #[test]
    fn test_row_maps_all_columns() {
        let record = row_to_record(&full_row()).unwrap();
        assert_eq!(record.name, "Proof of Play Apex");
        assert_eq!(record.project_id.as_deref(), Some("apex"));
        assert_eq!(record.raas_provider, "Conduit");
        assert_eq!(record.launch_date, Some("2023-12-13".parse().unwrap()));
        assert_eq!(record.vertical, "Gaming");
        assert_eq!(record.framework, "Arbitrum Orbit");
        assert_eq!(record.data_availability, "DAC");
        assert_eq!(record.layer, Layer::L3);
        assert_eq!(record.settlement, "Arbitrum One");
        assert!(record.is_mainnet());
    }

    #[test]
    fn test_row_missing_name_or_url_is_dropped() {
        let mut missing_name = full_row();
        missing_name[COL_NAME] = "  ".to_string();
        assert!(row_to_record(&missing_name).is_none());

        let mut missing_url = full_row();
        missing_url[COL_EXPLORER_URL] = String::new();
        assert!(row_to_record(&missing_url).is_none());
    }

    #[test]
    fn test_short_row_degrades_instead_of_panicking() {
        // Rows get truncated when trailing cells are blank in the sheet.
        let record = row_to_record(&row(&["Chain", "https://explorer.chain.io"])).unwrap();
        assert_eq!(record.project_id, None);
        assert_eq!(record.launch_date, None);
        assert_eq!(record.layer, Layer::Unknown);
        assert!(!record.is_mainnet());
    }

    #[test]
    fn test_launch_date_accepts_us_format() {
        assert_eq!(
            parse_launch_date("12/13/2023"),
            Some("2023-12-13".parse().unwrap())
        );
        assert_eq!(parse_launch_date("soon"), None);
    }
}
