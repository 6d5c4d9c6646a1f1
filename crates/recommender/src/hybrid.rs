//! Hybrid Recommendation Engine
//!
//! Runs collaborative and content-based filtering independently, each asked
//! for `top_n` candidates, and sums their scores over the union of returned
//! products. The two strategies score on different scales (predicted rating
//! vs. cosine similarity); the plain sum is kept as the default behaviour and
//! min-max normalization is available as an explicit opt-in.

use crate::collaborative::CollaborativeFilter;
use crate::content_based::ContentBasedEngine;
use crate::error::Result;
use crate::ranking::rank;
use crate::types::{Interaction, Product, ProductId, Recommendation, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// How sub-strategy scores are prepared before summing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    /// Sum raw scores
    #[default]
    None,
    /// Rescale each sub-list to [0, 1] before summing
    MinMax,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub normalization: ScoreNormalization,
}

#[derive(Debug, Clone, Default)]
pub struct HybridRecommender {
    collaborative: CollaborativeFilter,
    content: ContentBasedEngine,
    config: HybridConfig,
}

impl HybridRecommender {
    pub fn new(
        collaborative: CollaborativeFilter,
        content: ContentBasedEngine,
        config: HybridConfig,
    ) -> Self {
        Self {
            collaborative,
            content,
            config,
        }
    }

    pub fn with_default_config() -> Self {
        Self::default()
    }

    /// Combine both strategies. Any sub-strategy failure is returned as-is;
    /// there is no single-strategy fallback.
    #[instrument(skip(self, interactions, products), fields(interactions = interactions.len(), products = products.len()))]
    pub fn recommend(
        &self,
        target_user: UserId,
        reference_product: ProductId,
        interactions: &[Interaction],
        products: &[Product],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        let catalog: Vec<ProductId> = products.iter().map(|p| p.product_id).collect();

        let collaborative =
            self.collaborative
                .recommend(target_user, interactions, &catalog, top_n)?;
        let content = self.content.recommend(reference_product, products, top_n)?;
        debug!(
            collaborative = collaborative.len(),
            content = content.len(),
            "sub-strategy candidates collected"
        );

        match self.config.normalization {
            ScoreNormalization::None => Ok(merge_scores(&collaborative, &content, top_n)),
            ScoreNormalization::MinMax => {
                warn!("min-max normalization enabled, hybrid scores deviate from plain sums");
                Ok(merge_scores(
                    &min_max_normalize(&collaborative),
                    &min_max_normalize(&content),
                    top_n,
                ))
            }
        }
    }
}

/// Sum scores over the union of both lists; a product missing from one list
/// contributes 0 from that side.
pub fn merge_scores(
    collaborative: &[Recommendation],
    content: &[Recommendation],
    top_n: usize,
) -> Vec<Recommendation> {
    let mut combined: HashMap<ProductId, f64> = HashMap::new();
    for entry in collaborative.iter().chain(content) {
        *combined.entry(entry.product_id).or_insert(0.0) += entry.score;
    }

    let merged = combined
        .into_iter()
        .map(|(product_id, score)| Recommendation::new(product_id, score))
        .collect();

    rank(merged, top_n)
}

/// Rescale scores to [0, 1]; a list of equal scores maps to 1.0
pub fn min_max_normalize(entries: &[Recommendation]) -> Vec<Recommendation> {
    let min = entries.iter().map(|e| e.score).fold(f64::INFINITY, f64::min);
    let max = entries
        .iter()
        .map(|e| e.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    entries
        .iter()
        .map(|e| {
            let score = if span > 0.0 { (e.score - min) / span } else { 1.0 };
            Recommendation::new(e.product_id, score)
        })
        .collect()
}

/// Recommend by combining collaborative and content-based scores
pub fn hybrid_recommend(
    target_user: UserId,
    reference_product: ProductId,
    interactions: &[Interaction],
    products: &[Product],
    top_n: usize,
) -> Result<Vec<Recommendation>> {
    HybridRecommender::with_default_config().recommend(
        target_user,
        reference_product,
        interactions,
        products,
        top_n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_union() {
        let collaborative = vec![Recommendation::new(101, 4.5), Recommendation::new(102, 3.0)];
        let content = vec![Recommendation::new(102, 0.8), Recommendation::new(103, 0.6)];

        let merged = merge_scores(&collaborative, &content, 5);
        let ids: Vec<_> = merged.iter().map(|r| r.product_id).collect();

        assert_eq!(ids, vec![101, 102, 103]);
        assert!((merged[0].score - 4.5).abs() < 1e-12);
        assert!((merged[1].score - 3.8).abs() < 1e-12);
        assert!((merged[2].score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_merge_truncates() {
        let collaborative = vec![Recommendation::new(1, 2.0), Recommendation::new(2, 1.0)];
        let content = vec![Recommendation::new(3, 0.5)];
        assert_eq!(merge_scores(&collaborative, &content, 2).len(), 2);
    }

    #[test]
    fn test_min_max_normalize() {
        let normalized = min_max_normalize(&[
            Recommendation::new(1, 5.0),
            Recommendation::new(2, 3.0),
            Recommendation::new(3, 1.0),
        ]);
        let scores: Vec<_> = normalized.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![1.0, 0.5, 0.0]);

        let flat = min_max_normalize(&[Recommendation::new(1, 0.3), Recommendation::new(2, 0.3)]);
        assert!(flat.iter().all(|r| r.score == 1.0));
        assert!(min_max_normalize(&[]).is_empty());
    }
}
