//! Deterministic ordering shared by every strategy
//!
//! Entries are ordered by score descending with ties broken by product id
//! ascending, so identical inputs always produce identical output.

use crate::types::Recommendation;
use std::cmp::Ordering;

/// Total order over scores; a NaN score sorts ahead of every finite one
pub fn compare_ranked(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.product_id.cmp(&b.product_id))
}

/// Sort and keep the best `top_n` entries
pub fn rank(mut entries: Vec<Recommendation>, top_n: usize) -> Vec<Recommendation> {
    entries.sort_by(compare_ranked);
    entries.truncate(top_n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let entries = vec![
            Recommendation::new(30, 0.5),
            Recommendation::new(10, 0.9),
            Recommendation::new(20, 0.5),
            Recommendation::new(5, 0.1),
        ];

        let ranked = rank(entries, 3);
        let ids: Vec<_> = ranked.iter().map(|r| r.product_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_rank_with_nan_score_is_deterministic() {
        let entries = vec![
            Recommendation::new(1, 4.0),
            Recommendation::new(2, f64::NAN),
            Recommendation::new(3, 5.0),
        ];

        let forward = rank(entries.clone(), 3);
        let reversed = rank(entries.into_iter().rev().collect(), 3);

        let ids: Vec<_> = forward.iter().map(|r| r.product_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        let reversed_ids: Vec<_> = reversed.iter().map(|r| r.product_id).collect();
        assert_eq!(ids, reversed_ids);
    }

    #[test]
    fn test_rank_zero_top_n() {
        let ranked = rank(vec![Recommendation::new(1, 1.0)], 0);
        assert!(ranked.is_empty());
    }
}
