//! Storefront product recommendation engine
//!
//! Three strategies over in-memory tables supplied per call: collaborative
//! filtering on a user × product rating matrix, content-based filtering on
//! product descriptions, and a hybrid that sums both. Nothing is cached
//! between calls; every request trains and discards its own models.

pub mod catalog;
pub mod collaborative;
pub mod config;
pub mod content_based;
pub mod error;
pub mod hybrid;
pub mod matrix_factorization;
pub mod ranking;
pub mod server;
pub mod stopwords;
pub mod tfidf;
pub mod types;

// Re-export key types
pub use catalog::Catalog;
pub use collaborative::{collaborative_filter, CollaborativeFilter};
pub use config::RecommenderConfig;
pub use content_based::{content_based_recommend, ContentBasedEngine, ContentConfig};
pub use error::{RecommendError, Result};
pub use hybrid::{
    hybrid_recommend, merge_scores, HybridConfig, HybridRecommender, ScoreNormalization,
};
pub use matrix_factorization::{
    FactorizationConfig, MatrixFactorization, Solver, SparseMatrix, TrainingReport,
};
pub use types::*;

/// One recommendation call as received from the request layer
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRequest<'a> {
    pub user_id: UserId,
    pub reference_product: Option<ProductId>,
    pub method: RecommendationMethod,
    pub interactions: &'a [Interaction],
    pub products: &'a [Product],
    pub top_n: usize,
}

/// Recommender engine bound to a configuration
#[derive(Debug, Clone)]
pub struct RecommenderEngine {
    config: RecommenderConfig,
    collaborative: CollaborativeFilter,
    hybrid: HybridRecommender,
}

impl RecommenderEngine {
    pub fn new(config: RecommenderConfig) -> Self {
        let collaborative = CollaborativeFilter::new(config.factorization.clone());
        let content = ContentBasedEngine::new(config.content.clone());
        let hybrid = HybridRecommender::new(
            collaborative.clone(),
            content,
            config.hybrid.clone(),
        );

        Self {
            config,
            collaborative,
            hybrid,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(RecommenderConfig::default())
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Dispatch on the request's method: collaborative alone, or hybrid.
    ///
    /// Hybrid needs a reference product; its absence is a client error.
    pub fn recommend(&self, request: &RecommendationRequest<'_>) -> Result<Vec<Recommendation>> {
        tracing::info!(
            user_id = request.user_id,
            method = %request.method,
            reference_product = ?request.reference_product,
            top_n = request.top_n,
            "computing recommendations"
        );

        match request.method {
            RecommendationMethod::Collaborative => {
                let catalog = Catalog::new(request.products)?.product_ids();
                self.collaborative.recommend(
                    request.user_id,
                    request.interactions,
                    &catalog,
                    request.top_n,
                )
            }
            RecommendationMethod::Hybrid => {
                let reference = request.reference_product.ok_or_else(|| {
                    RecommendError::InvalidInput(
                        "hybrid recommendations require a product_id".to_string(),
                    )
                })?;
                self.hybrid.recommend(
                    request.user_id,
                    reference,
                    request.interactions,
                    request.products,
                    request.top_n,
                )
            }
        }
    }
}
