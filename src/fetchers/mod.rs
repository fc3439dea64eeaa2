pub mod analytics;
pub mod explorer;
pub mod proxy;

pub use analytics::{AnalyticsFetcher, TpsPoint, TvlPoint};
pub use explorer::{AccountPoint, ExplorerFetcher, TxnPoint};
pub use proxy::ProxyClient;
