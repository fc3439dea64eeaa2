use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Pass-through proxy configuration.
///
/// All upstream calls (registry sheet, block explorers, analytics host) are
/// routed through this endpoint with the target URL encoded into a query
/// parameter, since the upstreams do not serve cross-origin consumers.
#[derive(Debug, Deserialize, Clone)]
pub struct ProxySettings {
    pub base_url: String,
}

/// Chain registry source configuration.
///
/// The registry is a published spreadsheet returning positional rows,
/// one per chain. The full URL (including any API key) lives in config.
#[derive(Debug, Deserialize, Clone)]
pub struct RegistrySettings {
    pub sheet_url: String,
}

/// Analytics host configuration for TVL and TPS series.
///
/// Unlike the explorer endpoints, this host is queried by external project
/// id with a relative window rather than by explicit date bounds.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    #[serde(default = "default_analytics_host")]
    pub host: String,
    /// Relative window passed to the host ("max", "90 days", ...).
    #[serde(default = "default_analytics_range")]
    pub range: String,
}

fn default_analytics_host() -> String {
    "https://l2beat.com".to_string()
}

fn default_analytics_range() -> String {
    "max".to_string()
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            host: default_analytics_host(),
            range: default_analytics_range(),
        }
    }
}

/// Durable dataset cache configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    /// Directory holding one JSON record per dataset id.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

fn default_cache_dir() -> String {
    "cache".to_string()
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub proxy: ProxySettings,
    pub registry: RegistrySettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
