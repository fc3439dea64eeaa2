pub mod collector;
pub mod datasets;
pub mod manager;

pub use collector::EcosystemCollector;
pub use datasets::{Dataset, EcosystemBundle, RaasBundle, RaasProviderStats, TpsBundle};
pub use manager::DatasetManager;
