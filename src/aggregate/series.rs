use std::collections::BTreeMap;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::datekey::{month_key, week_key, DateRange};
use crate::fetchers::{AccountPoint, TpsPoint, TvlPoint, TxnPoint};

/// One day of the cross-chain transactions aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// Sum over finalized points only.
    pub final_total: u64,
    /// Sum over all points, provisional ones included. Shown as an estimate
    /// next to the authoritative total, never in place of it.
    pub approximate_total: u64,
}

/// Latest TVL breakdown of one chain, components in USD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TvlBreakdown {
    pub native: f64,
    pub canonical: f64,
    pub external: f64,
    pub total: f64,
}

/// Sum transactions across all chains per calendar day.
///
/// The result has exactly one entry per day of `range`, zero-filled where no
/// chain reported anything. Points outside the range are ignored. A chain
/// absent from `series` contributes 0 to every day, not "unknown".
pub fn aggregate_transactions_by_date(
    series: &FxHashMap<String, Vec<TxnPoint>>,
    range: &DateRange,
) -> BTreeMap<NaiveDate, DailyTotal> {
    let mut daily: BTreeMap<NaiveDate, DailyTotal> =
        range.days().map(|day| (day, DailyTotal::default())).collect();

    for points in series.values() {
        for point in points {
            if let Some(total) = daily.get_mut(&point.date) {
                total.approximate_total += point.value;
                if !point.is_approximate {
                    total.final_total += point.value;
                }
            }
        }
    }

    daily
}

/// Sum a plain-valued series (active accounts) across all chains per day,
/// zero-filled over `range`.
pub fn aggregate_counts_by_date(
    series: &FxHashMap<String, Vec<AccountPoint>>,
    range: &DateRange,
) -> BTreeMap<NaiveDate, u64> {
    let mut daily: BTreeMap<NaiveDate, u64> = range.days().map(|day| (day, 0)).collect();

    for points in series.values() {
        for point in points {
            if let Some(total) = daily.get_mut(&point.date) {
                *total += point.value;
            }
        }
    }

    daily
}

/// Finalized totals of a transactions aggregate, keyed by day.
pub fn final_totals(daily: &BTreeMap<NaiveDate, DailyTotal>) -> BTreeMap<NaiveDate, u64> {
    daily
        .iter()
        .map(|(day, total)| (*day, total.final_total))
        .collect()
}

/// Re-key a day-keyed aggregate into ISO weeks (`YYYY-WW`) and sum.
pub fn rekey_weekly(daily: &BTreeMap<NaiveDate, u64>) -> BTreeMap<String, u64> {
    rekey_by(daily, week_key)
}

/// Re-key a day-keyed aggregate into months (`YYYY-MM`) and sum.
pub fn rekey_monthly(daily: &BTreeMap<NaiveDate, u64>) -> BTreeMap<String, u64> {
    rekey_by(daily, month_key)
}

fn rekey_by<F>(daily: &BTreeMap<NaiveDate, u64>, key_fn: F) -> BTreeMap<String, u64>
where
    F: Fn(NaiveDate) -> String,
{
    let mut rekeyed: BTreeMap<String, u64> = BTreeMap::new();
    for (day, value) in daily {
        *rekeyed.entry(key_fn(*day)).or_insert(0) += value;
    }
    rekeyed
}

/// Sum of finalized totals over a sub-range, counting only days actually
/// present in the aggregate. No interpolation.
pub fn range_total(daily: &BTreeMap<NaiveDate, DailyTotal>, range: &DateRange) -> u64 {
    daily
        .range(range.from..=range.to)
        .map(|(_, total)| total.final_total)
        .sum()
}

/// Whole-series finalized total per chain, for rankings. Provisional points
/// are excluded.
pub fn chain_totals(series: &FxHashMap<String, Vec<TxnPoint>>) -> FxHashMap<String, u64> {
    series
        .iter()
        .map(|(name, points)| {
            let total = points
                .iter()
                .filter(|point| !point.is_approximate)
                .map(|point| point.value)
                .sum();
            (name.clone(), total)
        })
        .collect()
}

/// Latest TVL breakdown per chain (the newest point of each series). Chains
/// with empty series are omitted.
pub fn latest_tvl(series: &FxHashMap<String, Vec<TvlPoint>>) -> BTreeMap<String, TvlBreakdown> {
    series
        .iter()
        .filter_map(|(name, points)| {
            let latest = points.iter().max_by_key(|point| point.timestamp)?;
            Some((
                name.clone(),
                TvlBreakdown {
                    native: latest.native,
                    canonical: latest.canonical,
                    external: latest.external,
                    total: latest.total(),
                },
            ))
        })
        .collect()
}

/// Latest TPS per chain. Chains with empty series are omitted.
pub fn latest_tps(series: &FxHashMap<String, Vec<TpsPoint>>) -> BTreeMap<String, f64> {
    series
        .iter()
        .filter_map(|(name, points)| {
            let latest = points.iter().max_by_key(|point| point.timestamp)?;
            Some((name.clone(), latest.tps))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn txn(day: &str, value: u64) -> TxnPoint {
        TxnPoint {
            date: date(day),
            value,
            is_approximate: false,
        }
    }

    fn approx_txn(day: &str, value: u64) -> TxnPoint {
        TxnPoint {
            date: date(day),
            value,
            is_approximate: true,
        }
    }

    fn series(entries: Vec<(&str, Vec<TxnPoint>)>) -> FxHashMap<String, Vec<TxnPoint>> {
        entries
            .into_iter()
            .map(|(name, points)| (name.to_string(), points))
            .collect()
    }

    #[test]
    fn test_zero_fill_covers_every_day_in_range() {
        let input = series(vec![("a", vec![txn("2024-04-02", 10)])]);
        let range = DateRange::new(date("2024-04-01"), date("2024-04-04"));

        let daily = aggregate_transactions_by_date(&input, &range);

        assert_eq!(daily.len(), 4);
        assert_eq!(daily[&date("2024-04-01")].final_total, 0);
        assert_eq!(daily[&date("2024-04-02")].final_total, 10);
        assert_eq!(daily[&date("2024-04-04")].final_total, 0);
    }

    #[test]
    fn test_chains_sum_per_day_and_failed_chains_contribute_nothing() {
        // Five chains, one failed fetch (empty series): the aggregate equals
        // the sum of the four that succeeded.
        let input = series(vec![
            ("a", vec![txn("2024-04-01", 1)]),
            ("b", vec![txn("2024-04-01", 2)]),
            ("c", vec![]),
            ("d", vec![txn("2024-04-01", 4)]),
            ("e", vec![txn("2024-04-01", 8)]),
        ]);
        let range = DateRange::new(date("2024-04-01"), date("2024-04-01"));

        let daily = aggregate_transactions_by_date(&input, &range);
        assert_eq!(daily[&date("2024-04-01")].final_total, 15);
    }

    #[test]
    fn test_approximate_points_split_from_final_totals() {
        let input = series(vec![(
            "a",
            vec![txn("2024-04-01", 100), approx_txn("2024-04-02", 30)],
        )]);
        let range = DateRange::new(date("2024-04-01"), date("2024-04-02"));

        let daily = aggregate_transactions_by_date(&input, &range);
        assert_eq!(daily[&date("2024-04-01")].final_total, 100);
        assert_eq!(daily[&date("2024-04-01")].approximate_total, 100);
        assert_eq!(daily[&date("2024-04-02")].final_total, 0);
        assert_eq!(daily[&date("2024-04-02")].approximate_total, 30);
    }

    #[test]
    fn test_points_outside_range_are_ignored() {
        let input = series(vec![(
            "a",
            vec![txn("2024-03-31", 99), txn("2024-04-01", 1)],
        )]);
        let range = DateRange::new(date("2024-04-01"), date("2024-04-01"));

        let daily = aggregate_transactions_by_date(&input, &range);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[&date("2024-04-01")].final_total, 1);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let input = series(vec![
            ("a", vec![txn("2024-04-01", 7), approx_txn("2024-04-02", 3)]),
            ("b", vec![txn("2024-04-02", 5)]),
        ]);
        let range = DateRange::new(date("2024-04-01"), date("2024-04-03"));

        let first = aggregate_transactions_by_date(&input, &range);
        let second = aggregate_transactions_by_date(&input, &range);
        assert_eq!(first, second);
    }

    #[test]
    fn test_weekly_rekey_sums_iso_weeks() {
        // 2024-04-07 is a Sunday; 2024-04-08 starts the next ISO week.
        let daily: BTreeMap<NaiveDate, u64> = [
            (date("2024-04-06"), 1),
            (date("2024-04-07"), 2),
            (date("2024-04-08"), 4),
        ]
        .into_iter()
        .collect();

        let weekly = rekey_weekly(&daily);
        assert_eq!(weekly["2024-14"], 3);
        assert_eq!(weekly["2024-15"], 4);
    }

    #[test]
    fn test_monthly_rekey() {
        let daily: BTreeMap<NaiveDate, u64> = [
            (date("2024-03-31"), 10),
            (date("2024-04-01"), 20),
            (date("2024-04-02"), 30),
        ]
        .into_iter()
        .collect();

        let monthly = rekey_monthly(&daily);
        assert_eq!(monthly["2024-03"], 10);
        assert_eq!(monthly["2024-04"], 50);
    }

    #[test]
    fn test_range_total_counts_only_present_days() {
        let input = series(vec![("a", vec![txn("2024-04-01", 5), txn("2024-04-03", 7)])]);
        let daily = aggregate_transactions_by_date(
            &input,
            &DateRange::new(date("2024-04-01"), date("2024-04-03")),
        );

        // Sub-range extends past the aggregate; absent days add nothing.
        let window = DateRange::new(date("2024-04-02"), date("2024-04-10"));
        assert_eq!(range_total(&daily, &window), 7);
    }

    #[test]
    fn test_chain_totals_exclude_provisional_points() {
        let input = series(vec![(
            "a",
            vec![txn("2024-04-01", 10), approx_txn("2024-04-02", 5)],
        )]);
        let totals = chain_totals(&input);
        assert_eq!(totals["a"], 10);
    }

    #[test]
    fn test_latest_tvl_picks_newest_point() {
        let mut input: FxHashMap<String, Vec<TvlPoint>> = FxHashMap::default();
        input.insert(
            "a".to_string(),
            vec![
                TvlPoint {
                    timestamp: 200,
                    native: 5.0,
                    canonical: 1.0,
                    external: 0.5,
                },
                TvlPoint {
                    timestamp: 100,
                    native: 99.0,
                    canonical: 0.0,
                    external: 0.0,
                },
            ],
        );
        input.insert("empty".to_string(), vec![]);

        let latest = latest_tvl(&input);
        assert_eq!(latest["a"].total, 6.5);
        assert!(!latest.contains_key("empty"));
    }
}
