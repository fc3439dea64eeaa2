//! Pure cross-chain aggregation functions.
//!
//! This module is organized into focused submodules:
//!
//! - [`datekey`] - Date ranges and day/ISO-week/month keying
//! - [`series`] - Cross-chain date aggregates, zero-fill, re-keying
//! - [`rankings`] - Top-N rankings, shares, percentage changes
//! - [`categories`] - Category normalization, group-by, cross-tabs
//!
//! Everything here is deterministic for fixed input and never fails: per
//! point problems were already coerced at the fetch boundary, and grouping
//! falls back to the `"Unknown"` sentinel instead of rejecting records.

mod categories;
mod datekey;
mod rankings;
mod series;

pub use categories::{
    cross_tab, group_by, normalize_category, sum_by, tally_by, CategoryTally, CrossTabGroup,
    UNKNOWN_CATEGORY,
};
pub use datekey::{day_key, month_key, week_key, DateRange, DEFAULT_LOOKBACK_DAYS};
pub use rankings::{format_percentage_increase, percentage_increase, top_n, RankedChain};
pub use series::{
    aggregate_counts_by_date, aggregate_transactions_by_date, chain_totals, final_totals,
    latest_tps, latest_tvl, range_total, rekey_monthly, rekey_weekly, DailyTotal, TvlBreakdown,
};
