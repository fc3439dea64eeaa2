use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Settlement layer classification from the registry sheet.
///
/// The sheet stores this as free text; anything that is not recognizably an
/// L2 or L3 marker maps to `Unknown` rather than failing the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    L2,
    L3,
    Unknown,
}

impl Layer {
    /// Case-insensitive parse of the raw sheet value.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "l2" | "layer 2" | "layer2" => Layer::L2,
            "l3" | "layer 3" | "layer3" => Layer::L3,
            _ => Layer::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::L2 => "L2",
            Layer::L3 => "L3",
            Layer::Unknown => "Unknown",
        }
    }
}

/// One chain row from the registry sheet.
///
/// Parsed and validated at the boundary; immutable afterwards. Category
/// fields stay as the raw trimmed text here; folding and the `"Unknown"`
/// sentinel are applied by the aggregation layer at grouping time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainRecord {
    /// Unique display key across the registry.
    pub name: String,
    /// Block explorer base URL, used for the per-date metric endpoints.
    pub explorer_url: String,
    /// External project id on the analytics host (TVL/TPS). Not every chain
    /// is listed there.
    pub project_id: Option<String>,
    pub website: String,
    pub raas_provider: String,
    pub launch_date: Option<NaiveDate>,
    pub vertical: String,
    pub framework: String,
    pub data_availability: String,
    pub layer: Layer,
    pub settlement: String,
    pub logo_url: String,
    pub status: String,
}

impl ChainRecord {
    pub fn is_mainnet(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("mainnet")
    }

    /// Explorer base URL with trailing slashes stripped, ready for joining
    /// with endpoint paths.
    pub fn explorer_base(&self) -> &str {
        self.explorer_url.trim_end_matches('/')
    }

    /// Launch window label ("2023 Q3") derived from the launch date.
    pub fn launch_quarter(&self) -> Option<String> {
        let date = self.launch_date?;
        let quarter = (date.month0() / 3) + 1;
        Some(format!("{} Q{}", date.year(), quarter))
    }
}
