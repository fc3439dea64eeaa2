use chrono::{Datelike, Days, NaiveDate};

use crate::registry::ChainRecord;

/// Fetch window for chains without a recorded launch date.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 365;

/// Inclusive calendar date range.
///
/// Used both as the fetch window for the per-date explorer endpoints and as
/// the zero-fill domain of date aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// Default fetch window for one chain: launch date through `today`.
    /// Chains without a launch date fall back to a fixed lookback.
    pub fn for_chain(chain: &ChainRecord, today: NaiveDate) -> Self {
        let from = chain
            .launch_date
            .unwrap_or_else(|| today - Days::new(DEFAULT_LOOKBACK_DAYS));
        Self::new(from, today)
    }

    /// Window covering every chain in the batch: earliest launch date
    /// through `today`.
    pub fn spanning(chains: &[ChainRecord], today: NaiveDate) -> Self {
        let from = chains
            .iter()
            .filter_map(|chain| chain.launch_date)
            .min()
            .unwrap_or_else(|| today - Days::new(DEFAULT_LOOKBACK_DAYS));
        Self::new(from, today)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.from.iter_days().take_while(move |d| *d <= self.to)
    }
}

/// Calendar day key (`YYYY-MM-DD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO week key (`YYYY-WW`, weeks starting Monday). The year is the ISO week
/// year, which differs from the calendar year around January 1st.
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{:04}-{:02}", iso.year(), iso.week())
}

/// Month key (`YYYY-MM`).
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_range_days_are_inclusive() {
        let range = DateRange::new(date("2024-01-30"), date("2024-02-02"));
        let days: Vec<NaiveDate> = range.days().collect();
        assert_eq!(
            days,
            vec![
                date("2024-01-30"),
                date("2024-01-31"),
                date("2024-02-01"),
                date("2024-02-02"),
            ]
        );
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let range = DateRange::new(date("2024-02-02"), date("2024-01-30"));
        assert_eq!(range.from, date("2024-01-30"));
        assert_eq!(range.to, date("2024-02-02"));
    }

    #[test]
    fn test_week_key_starts_monday() {
        // 2024-04-07 is a Sunday, 2024-04-08 the following Monday.
        assert_eq!(week_key(date("2024-04-07")), "2024-14");
        assert_eq!(week_key(date("2024-04-08")), "2024-15");
    }

    #[test]
    fn test_week_key_uses_iso_year_at_rollover() {
        // 2024-12-30 (Monday) belongs to ISO week 1 of 2025.
        assert_eq!(week_key(date("2024-12-30")), "2025-01");
        // 2027-01-01 (Friday) belongs to ISO week 53 of 2026.
        assert_eq!(week_key(date("2027-01-01")), "2026-53");
    }

    #[test]
    fn test_day_and_month_keys() {
        assert_eq!(day_key(date("2024-04-08")), "2024-04-08");
        assert_eq!(month_key(date("2024-04-08")), "2024-04");
    }
}
