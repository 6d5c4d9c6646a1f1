//! Content-based filtering implementation
//!
//! Uses TF-IDF vectors of product descriptions to find items similar to a
//! reference product.

use crate::catalog::Catalog;
use crate::error::{RecommendError, Result};
use crate::ranking::rank;
use crate::stopwords::StopWords;
use crate::tfidf::TfidfVectorizer;
use crate::types::{Product, ProductId, Recommendation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Content similarity settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Exclude English stop words from the vocabulary (default: true)
    pub english_stop_words: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            english_stop_words: true,
        }
    }
}

/// Content-based recommendation engine
#[derive(Debug, Clone, Default)]
pub struct ContentBasedEngine {
    config: ContentConfig,
}

impl ContentBasedEngine {
    pub fn new(config: ContentConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::default()
    }

    fn vectorizer(&self) -> TfidfVectorizer {
        if self.config.english_stop_words {
            TfidfVectorizer::new(StopWords::english())
        } else {
            TfidfVectorizer::new(StopWords::none())
        }
    }

    /// Rank every other catalog product by description similarity to
    /// `reference`. Zero-similarity products stay in the list.
    #[instrument(skip(self, products), fields(products = products.len()))]
    pub fn recommend(
        &self,
        reference: ProductId,
        products: &[Product],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {
        if products.len() < 2 {
            return Err(RecommendError::InsufficientData(format!(
                "need at least 2 products to compare, got {}",
                products.len()
            )));
        }

        let catalog = Catalog::new(products)?;
        let reference_idx = catalog
            .position(reference)
            .ok_or(RecommendError::ProductNotFound(reference))?;

        let descriptions: Vec<&str> = products.iter().map(|p| p.description.as_str()).collect();
        let mut vectorizer = self.vectorizer();
        let vectors = vectorizer.fit_transform(&descriptions);
        debug!(
            vocabulary = vectorizer.vocabulary_size(),
            "description vectors built"
        );

        let similarities = vectors.dot(&vectors.row(reference_idx));

        let scored = products
            .iter()
            .zip(similarities.iter())
            .filter(|(product, _)| product.product_id != reference)
            .map(|(product, &similarity)| {
                Recommendation::new(product.product_id, similarity.clamp(0.0, 1.0))
            })
            .collect();

        Ok(rank(scored, top_n))
    }
}

/// Recommend products whose descriptions resemble `reference`
pub fn content_based_recommend(
    reference: ProductId,
    products: &[Product],
    top_n: usize,
) -> Result<Vec<Recommendation>> {
    ContentBasedEngine::with_default_config().recommend(reference, products, top_n)
}
