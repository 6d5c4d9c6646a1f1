//! Collaborative Filtering
//!
//! Trains a biased matrix factorization over the supplied rating table and
//! predicts a rating for every candidate product the target user has not
//! rated yet. The model lives only for the duration of one call.

use crate::catalog::ensure_trainable;
use crate::error::Result;
use crate::matrix_factorization::{FactorizationConfig, MatrixFactorization};
use crate::ranking::rank;
use crate::types::{Interaction, ProductId, Recommendation, UserId};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, instrument};

/// Collaborative Filtering Engine
#[derive(Debug, Clone, Default)]
pub struct CollaborativeFilter {
    config: FactorizationConfig,
}

impl CollaborativeFilter {
    pub fn new(config: FactorizationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &FactorizationConfig {
        &self.config
    }

    /// Recommend unrated products for `target_user`.
    ///
    /// Candidates are the union of `catalog` and every product seen in
    /// `interactions`, minus the products the user already rated. A user with
    /// no history is scored from the global mean and item biases.
    #[instrument(skip(self, interactions, catalog), fields(interactions = interactions.len(), catalog = catalog.len()))]
    pub fn recommend(
        &self,
        target_user: UserId,
        interactions: &[Interaction],
        catalog: &[ProductId],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        ensure_trainable(interactions)?;

        let mut model = MatrixFactorization::new(self.config.clone());
        let matrix = model.build_matrix(interactions)?;
        let report = model.fit(&matrix)?;
        debug!(
            train_size = report.train_size,
            validation_size = report.validation_size,
            train_rmse = report.train_rmse,
            validation_rmse = ?report.validation_rmse,
            "collaborative model trained"
        );

        let rated: HashSet<ProductId> = interactions
            .iter()
            .filter(|i| i.user_id == target_user)
            .map(|i| i.product_id)
            .collect();
        if rated.is_empty() {
            debug!("cold-start user, predicting from biases only");
        }

        let candidates: BTreeSet<ProductId> = catalog
            .iter()
            .chain(model.item_ids.iter())
            .copied()
            .filter(|product_id| !rated.contains(product_id))
            .collect();

        let scored = candidates
            .into_iter()
            .map(|product_id| {
                model
                    .predict(target_user, product_id)
                    .map(|score| Recommendation::new(product_id, score))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(rank(scored, top_n))
    }
}

/// Recommend products for `target_user` from the products present in `interactions`
pub fn collaborative_filter(
    target_user: UserId,
    interactions: &[Interaction],
    top_n: usize,
) -> Result<Vec<Recommendation>> {
    CollaborativeFilter::with_default_config().recommend(target_user, interactions, &[], top_n)
}
