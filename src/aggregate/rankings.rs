use serde::{Deserialize, Serialize};

/// One entry of a top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChain {
    pub name: String,
    pub total: f64,
    /// Share of the combined total, in percent, rounded to 2 decimals.
    pub share: f64,
}

/// Top `n` chains by total, descending.
///
/// The sort is stable, so ties keep the caller's order (registry order by
/// convention). Shares are computed against `combined_total` when it is
/// finite and positive, otherwise against the sum over every ranked chain;
/// a zero denominator yields 0.00 shares rather than NaN.
pub fn top_n(totals: &[(String, f64)], n: usize, combined_total: Option<f64>) -> Vec<RankedChain> {
    let denominator = combined_total
        .filter(|total| total.is_finite() && *total > 0.0)
        .unwrap_or_else(|| totals.iter().map(|(_, value)| value).sum());

    let mut ranked: Vec<&(String, f64)> = totals.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    ranked
        .into_iter()
        .take(n)
        .map(|(name, value)| {
            let share = if denominator > 0.0 {
                round2(value / denominator * 100.0)
            } else {
                0.0
            };
            RankedChain {
                name: name.clone(),
                total: *value,
                share,
            }
        })
        .collect()
}

/// Percentage change between period totals. `None` when the previous total
/// is not positive, since the change is undefined there.
pub fn percentage_increase(current: f64, previous: f64) -> Option<f64> {
    if previous > 0.0 {
        Some((current - previous) / previous * 100.0)
    } else {
        None
    }
}

/// Render a percentage change for display: "50.00%", or "N/A" when the
/// change is undefined.
pub fn format_percentage_increase(change: Option<f64>) -> String {
    match change {
        Some(value) => format!("{value:.2}%"),
        None => "N/A".to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
