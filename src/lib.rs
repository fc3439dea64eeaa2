pub mod aggregate;
pub mod cache;
pub mod config;
pub mod cron;
pub mod error;
pub mod fetchers;
pub mod registry;
pub mod worker;

pub use cache::CacheStore;
pub use config::Settings;
pub use cron::{CronScheduler, CronSettings};
pub use error::FetchError;
pub use registry::{ChainRecord, RegistrySource};
pub use worker::{Dataset, DatasetManager, EcosystemCollector};
