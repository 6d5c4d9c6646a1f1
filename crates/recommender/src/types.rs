//! Core data types shared by the recommendation strategies

use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;
pub type ProductId = i64;

/// A single user → product rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: f64,
}

impl Interaction {
    pub fn new(user_id: UserId, product_id: ProductId, rating: f64) -> Self {
        Self {
            user_id,
            product_id,
            rating,
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    /// Free-text description used for content similarity (may be empty)
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    /// Image reference (URL or asset path)
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    pub fn new(product_id: ProductId, description: impl Into<String>) -> Self {
        Self {
            product_id,
            description: description.into(),
            price: 0.0,
            image: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Ranked output entry
///
/// The score scale depends on the strategy that produced it: a predicted
/// rating for collaborative filtering, a cosine similarity for content-based
/// filtering, and an unscaled sum for the hybrid combiner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: ProductId,
    pub score: f64,
}

impl Recommendation {
    pub fn new(product_id: ProductId, score: f64) -> Self {
        Self { product_id, score }
    }
}

/// Strategy selected by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationMethod {
    Collaborative,
    #[default]
    Hybrid,
}

impl RecommendationMethod {
    /// Only `"collaborative"` selects collaborative filtering; anything else,
    /// including a missing parameter, falls through to hybrid.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("collaborative") => RecommendationMethod::Collaborative,
            _ => RecommendationMethod::Hybrid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationMethod::Collaborative => "collaborative",
            RecommendationMethod::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for RecommendationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
