use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::registry::ChainRecord;

/// Sentinel group for absent or blank category values.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Normalize a raw category value: trimmed, blank collapses to
/// [`UNKNOWN_CATEGORY`]. Casing is preserved here; grouping folds it.
pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Tally of one category group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub count: usize,
    /// Contributing chains in registry order, for drill-down display.
    pub chains: Vec<String>,
}

/// One outer group of a two-level cross-tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossTabGroup {
    pub count: usize,
    pub chains: Vec<String>,
    /// Inner-category tallies within this group.
    pub breakdown: Vec<(String, CategoryTally)>,
}

/// Group chains by an extracted category key.
///
/// Keys fold case-insensitively, so "Gaming" and " gaming " land in one
/// group; the displayed spelling is the first one seen. Groups appear in
/// order of first appearance and members keep registry order, which makes
/// every downstream aggregate deterministic for fixed input.
pub fn group_by<F>(chains: &[ChainRecord], key_fn: F) -> Vec<(String, Vec<&ChainRecord>)>
where
    F: Fn(&ChainRecord) -> String,
{
    let mut groups: Vec<(String, Vec<&ChainRecord>)> = Vec::new();
    let mut index_by_key: FxHashMap<String, usize> = FxHashMap::default();

    for chain in chains {
        let display = normalize_category(&key_fn(chain));
        let folded = display.to_lowercase();

        match index_by_key.get(&folded) {
            Some(&index) => groups[index].1.push(chain),
            None => {
                index_by_key.insert(folded, groups.len());
                groups.push((display, vec![chain]));
            },
        }
    }

    groups
}

/// Count chains per category, with the contributing chain names.
pub fn tally_by<F>(chains: &[ChainRecord], key_fn: F) -> Vec<(String, CategoryTally)>
where
    F: Fn(&ChainRecord) -> String,
{
    group_by(chains, key_fn)
        .into_iter()
        .map(|(display, members)| {
            let tally = CategoryTally {
                count: members.len(),
                chains: members.iter().map(|chain| chain.name.clone()).collect(),
            };
            (display, tally)
        })
        .collect()
}

/// Two-level cross-tab: group by `outer_fn`, tally `inner_fn` within each
/// group.
pub fn cross_tab<F, G>(
    chains: &[ChainRecord],
    outer_fn: F,
    inner_fn: G,
) -> Vec<(String, CrossTabGroup)>
where
    F: Fn(&ChainRecord) -> String,
    G: Fn(&ChainRecord) -> String,
{
    group_by(chains, outer_fn)
        .into_iter()
        .map(|(display, members)| {
            let owned: Vec<ChainRecord> = members.iter().map(|&chain| chain.clone()).collect();
            let group = CrossTabGroup {
                count: members.len(),
                chains: members.iter().map(|chain| chain.name.clone()).collect(),
                breakdown: tally_by(&owned, &inner_fn),
            };
            (display, group)
        })
        .collect()
}

/// Sum a per-chain metric total within each category group. Chains missing
/// from `totals` contribute 0.
pub fn sum_by<F>(
    chains: &[ChainRecord],
    key_fn: F,
    totals: &FxHashMap<String, f64>,
) -> Vec<(String, f64)>
where
    F: Fn(&ChainRecord) -> String,
{
    group_by(chains, key_fn)
        .into_iter()
        .map(|(display, members)| {
            let sum = members
                .iter()
                .map(|chain| totals.get(&chain.name).copied().unwrap_or(0.0))
                .sum();
            (display, sum)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Layer;

    fn chain(name: &str, vertical: &str, framework: &str) -> ChainRecord {
        ChainRecord {
            name: name.to_string(),
            explorer_url: "https://explorer.example.com".to_string(),
            project_id: None,
            website: String::new(),
            raas_provider: String::new(),
            launch_date: None,
            vertical: vertical.to_string(),
            framework: framework.to_string(),
            data_availability: String::new(),
            layer: Layer::Unknown,
            settlement: String::new(),
            logo_url: String::new(),
            status: "Mainnet".to_string(),
        }
    }

    #[test]
    fn test_blank_and_padded_verticals_fold_into_expected_groups() {
        // "Gaming", " gaming ", "" and a whitespace-only value must group as
        // {"Gaming": 2, "Unknown": 2}.
        let chains = vec![
            chain("a", "Gaming", ""),
            chain("b", " gaming ", ""),
            chain("c", "", ""),
            chain("d", "   ", ""),
        ];

        let tallies = tally_by(&chains, |c| c.vertical.clone());
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[0].0, "Gaming");
        assert_eq!(tallies[0].1.count, 2);
        assert_eq!(tallies[0].1.chains, vec!["a", "b"]);
        assert_eq!(tallies[1].0, UNKNOWN_CATEGORY);
        assert_eq!(tallies[1].1.count, 2);
    }

    #[test]
    fn test_display_spelling_is_first_seen() {
        // Same fold either way; the first spelling encountered wins display.
        let chains = vec![chain("a", "deFi", ""), chain("b", "DeFi", "")];
        let tallies = tally_by(&chains, |c| c.vertical.clone());
        assert_eq!(tallies[0].0, "deFi");
        assert_eq!(tallies[0].1.count, 2);
    }

    #[test]
    fn test_groups_follow_first_appearance_order() {
        let chains = vec![
            chain("a", "Gaming", ""),
            chain("b", "DeFi", ""),
            chain("c", "Gaming", ""),
        ];
        let groups = group_by(&chains, |c| c.vertical.clone());
        let keys: Vec<&str> = groups.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["Gaming", "DeFi"]);
    }

    #[test]
    fn test_cross_tab_tallies_inner_category_per_group() {
        let chains = vec![
            chain("a", "Gaming", "OP Stack"),
            chain("b", "Gaming", "Arbitrum Orbit"),
            chain("c", "Gaming", "OP Stack"),
            chain("d", "DeFi", "OP Stack"),
        ];

        let tab = cross_tab(&chains, |c| c.vertical.clone(), |c| c.framework.clone());
        assert_eq!(tab.len(), 2);

        let (vertical, gaming) = &tab[0];
        assert_eq!(vertical, "Gaming");
        assert_eq!(gaming.count, 3);
        assert_eq!(gaming.chains, vec!["a", "b", "c"]);
        assert_eq!(gaming.breakdown[0].0, "OP Stack");
        assert_eq!(gaming.breakdown[0].1.count, 2);
        assert_eq!(gaming.breakdown[1].0, "Arbitrum Orbit");
        assert_eq!(gaming.breakdown[1].1.count, 1);
    }

    #[test]
    fn test_sum_by_treats_missing_totals_as_zero() {
        let chains = vec![
            chain("a", "Gaming", ""),
            chain("b", "Gaming", ""),
            chain("c", "DeFi", ""),
        ];
        let mut totals: FxHashMap<String, f64> = FxHashMap::default();
        totals.insert("a".to_string(), 10.0);
        totals.insert("c".to_string(), 5.0);

        let sums = sum_by(&chains, |c| c.vertical.clone(), &totals);
        assert_eq!(sums[0], ("Gaming".to_string(), 10.0));
        assert_eq!(sums[1], ("DeFi".to_string(), 5.0));
    }
}
