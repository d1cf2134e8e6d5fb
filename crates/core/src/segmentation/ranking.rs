//! Stable ranking of arbitrary cluster labels.
//!
//! K-means labels carry no meaning; ranking them by mean monetary value turns
//! "rank 0" into "highest average spend" on every run.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::segmentation_model::{RankProfile, RankedRfmRow, RfmRow};

/// Maps each raw label to its rank: clusters sorted by mean monetary value
/// descending, ties broken by ascending raw label. Ranks are contiguous from 0
/// over the labels that actually occur.
pub fn cluster_rank_map(rows: &[RfmRow], labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut totals: BTreeMap<usize, (Decimal, u32)> = BTreeMap::new();
    for (row, &label) in rows.iter().zip(labels) {
        let entry = totals.entry(label).or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(row.monetary);
        entry.1 += 1;
    }

    let mut means: Vec<(usize, Decimal)> = totals
        .into_iter()
        .map(|(label, (total, count))| (label, total / Decimal::from(count)))
        .collect();
    means.sort_by(|(label_a, mean_a), (label_b, mean_b)| {
        mean_b.cmp(mean_a).then_with(|| label_a.cmp(label_b))
    });

    means
        .into_iter()
        .enumerate()
        .map(|(rank, (label, _))| (label, rank))
        .collect()
}

/// Attaches `cluster_rank` to every row. `labels[i]` is the raw label of
/// `rows[i]`.
pub fn rank_clusters(rows: &[RfmRow], labels: &[usize]) -> Vec<RankedRfmRow> {
    debug_assert_eq!(rows.len(), labels.len());
    let ranks = cluster_rank_map(rows, labels);
    rows.iter()
        .zip(labels)
        .map(|(row, label)| RankedRfmRow {
            customer_id: row.customer_id.clone(),
            recency_days: row.recency_days,
            frequency: row.frequency,
            monetary: row.monetary,
            cluster_rank: ranks[label],
        })
        .collect()
}

/// Mean features per rank, ordered by rank.
pub fn rank_profiles(rows: &[RankedRfmRow]) -> Vec<RankProfile> {
    let mut grouped: BTreeMap<usize, Vec<&RankedRfmRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.cluster_rank).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(rank, members)| {
            let count = members.len();
            let total_monetary = members
                .iter()
                .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.monetary));
            let total_recency: i64 = members.iter().map(|r| r.recency_days).sum();
            let total_frequency: i64 = members.iter().map(|r| r.frequency).sum();
            RankProfile {
                rank,
                customers: count,
                mean_recency_days: total_recency.to_f64().unwrap_or_default() / count as f64,
                mean_frequency: total_frequency.to_f64().unwrap_or_default() / count as f64,
                mean_monetary: total_monetary / Decimal::from(count),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(id: &str, monetary: Decimal) -> RfmRow {
        RfmRow {
            customer_id: id.to_string(),
            recency_days: 1,
            frequency: 1,
            monetary,
        }
    }

    #[test]
    fn test_highest_mean_spend_gets_rank_zero() {
        let rows = vec![row("a", dec!(100)), row("b", dec!(50)), row("c", dec!(10))];
        // Label 1 happens to hold the top spender.
        let ranked = rank_clusters(&rows, &[1, 0, 0]);
        assert_eq!(ranked[0].cluster_rank, 0);
        assert_eq!(ranked[1].cluster_rank, 1);
        assert_eq!(ranked[2].cluster_rank, 1);
    }

    #[test]
    fn test_ranking_ignores_label_permutation() {
        let rows = vec![
            row("a", dec!(5)),
            row("b", dec!(500)),
            row("c", dec!(50)),
            row("d", dec!(55)),
        ];
        let ranks_one: Vec<usize> = rank_clusters(&rows, &[2, 0, 1, 1])
            .iter()
            .map(|r| r.cluster_rank)
            .collect();
        let ranks_two: Vec<usize> = rank_clusters(&rows, &[0, 1, 2, 2])
            .iter()
            .map(|r| r.cluster_rank)
            .collect();
        assert_eq!(ranks_one, vec![2, 0, 1, 1]);
        assert_eq!(ranks_one, ranks_two);
    }

    #[test]
    fn test_equal_means_break_ties_by_label() {
        let rows = vec![row("a", dec!(10)), row("b", dec!(10))];
        let map = cluster_rank_map(&rows, &[7, 3]);
        assert_eq!(map[&3], 0);
        assert_eq!(map[&7], 1);
    }

    #[test]
    fn test_ranks_are_contiguous_when_labels_skip() {
        let rows = vec![row("a", dec!(1)), row("b", dec!(2))];
        let map = cluster_rank_map(&rows, &[4, 9]);
        let mut ranks: Vec<usize> = map.values().copied().collect();
        ranks.sort();
        assert_eq!(ranks, vec![0, 1]);
    }

    #[test]
    fn test_profiles_average_each_rank() {
        let rows = vec![row("a", dec!(100)), row("b", dec!(50)), row("c", dec!(10))];
        let ranked = rank_clusters(&rows, &[0, 1, 1]);
        let profiles = rank_profiles(&ranked);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].mean_monetary, dec!(100));
        assert_eq!(profiles[1].customers, 2);
        assert_eq!(profiles[1].mean_monetary, dec!(30));
        assert_eq!(profiles[1].mean_frequency, 1.0);
    }
}
