//! Error kinds crossing the fetch and cache stage boundaries.
//!
//! Per-chain and per-point failures are recovered where they occur and never
//! travel further than the aggregation layer. Only whole-dataset failures
//! (registry unavailable, every chain failing) reach the consumer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The chain registry could not be fetched, or contained no usable rows.
    /// Fatal to the requested dataset.
    #[error("registry source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single chain's metric fetch failed. Recovered locally as an empty
    /// series; the aggregate is simply short that chain's contribution.
    #[error("metric fetch failed for chain {chain}: {reason}")]
    ChainFetchFailed { chain: String, reason: String },

    /// A metric value failed numeric parsing. Coerced to 0 at the point of
    /// use; the aggregation continues.
    #[error("malformed metric value for {chain} at {key}: {raw:?}")]
    MalformedPoint {
        chain: String,
        key: String,
        raw: String,
    },

    /// Every chain in the batch failed to produce data, so the dataset would
    /// be empty. Surfaced as a single whole-dataset failure.
    #[error("no chain produced data for dataset {0}")]
    DatasetEmpty(&'static str),

    /// The local cache could not be read. Treated as a forced miss.
    #[error("cache read failed for {id}: {reason}")]
    CacheRead { id: String, reason: String },

    /// The local cache could not be written. The freshly built bundle is
    /// still served; only the performance benefit is lost.
    #[error("cache write failed for {id}: {reason}")]
    CacheWrite { id: String, reason: String },
}
