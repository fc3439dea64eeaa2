mod config;

pub use config::{
    AnalyticsSettings, CacheSettings, ProxySettings, RegistrySettings, Settings,
};
