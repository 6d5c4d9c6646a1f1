//! Per-request product index and input validation
//!
//! The catalog is indexed once per call so that candidate enumeration and the
//! response join never scan the product list repeatedly.

use crate::error::{RecommendError, Result};
use crate::types::{Interaction, Product, ProductId};
use std::collections::{HashMap, HashSet};

/// Product lookup by identifier, borrowed from the caller's table
#[derive(Debug, Clone)]
pub struct Catalog<'a> {
    products: &'a [Product],
    index: HashMap<ProductId, usize>,
}

impl<'a> Catalog<'a> {
    /// Index the product table, rejecting duplicate identifiers
    pub fn new(products: &'a [Product]) -> Result<Self> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if index.insert(product.product_id, position).is_some() {
                return Err(RecommendError::InvalidInput(format!(
                    "duplicate product id {} in catalog",
                    product.product_id
                )));
            }
        }

        Ok(Self { products, index })
    }

    pub fn get(&self, product_id: ProductId) -> Option<&'a Product> {
        self.index.get(&product_id).map(|&i| &self.products[i])
    }

    /// Row position of a product in the original table
    pub fn position(&self, product_id: ProductId) -> Option<usize> {
        self.index.get(&product_id).copied()
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.products.iter().map(|p| p.product_id).collect()
    }
}

/// Reject ratings that are not finite or fall outside the rating scale
pub fn validate_interactions(
    interactions: &[Interaction],
    rating_min: f64,
    rating_max: f64,
) -> Result<()> {
    for interaction in interactions {
        let rating = interaction.rating;
        if !rating.is_finite() || rating < rating_min || rating > rating_max {
            return Err(RecommendError::InvalidInput(format!(
                "rating {} for user {} / product {} is outside [{}, {}]",
                rating, interaction.user_id, interaction.product_id, rating_min, rating_max
            )));
        }
    }
    Ok(())
}

/// A factorization needs at least two distinct users and two distinct products
pub fn ensure_trainable(interactions: &[Interaction]) -> Result<()> {
    if interactions.is_empty() {
        return Err(RecommendError::InsufficientData(
            "no interactions supplied".to_string(),
        ));
    }

    let users: HashSet<_> = interactions.iter().map(|i| i.user_id).collect();
    if users.len() < 2 {
        return Err(RecommendError::InsufficientData(format!(
            "need at least 2 distinct users, got {}",
            users.len()
        )));
    }

    let products: HashSet<_> = interactions.iter().map(|i| i.product_id).collect();
    if products.len() < 2 {
        return Err(RecommendError::InsufficientData(format!(
            "need at least 2 distinct products, got {}",
            products.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let products = vec![Product::new(101, "red mug"), Product::new(102, "blue mug")];
        let catalog = Catalog::new(&products).unwrap();

        assert_eq!(catalog.position(102), Some(1));
        assert_eq!(catalog.get(101).unwrap().description, "red mug");
        assert!(catalog.get(999).is_none());
        assert_eq!(catalog.position(999), None);
        assert_eq!(catalog.product_ids(), vec![101, 102]);
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let products = vec![Product::new(1, "a"), Product::new(1, "b")];
        let err = Catalog::new(&products).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_interactions_bounds() {
        let ok = vec![Interaction::new(1, 1, 1.0), Interaction::new(1, 2, 5.0)];
        assert!(validate_interactions(&ok, 1.0, 5.0).is_ok());

        let too_high = vec![Interaction::new(1, 1, 6.0)];
        assert!(validate_interactions(&too_high, 1.0, 5.0).is_err());

        let nan = vec![Interaction::new(1, 1, f64::NAN)];
        assert!(validate_interactions(&nan, 1.0, 5.0).is_err());
    }

    #[test]
    fn test_ensure_trainable() {
        assert!(matches!(
            ensure_trainable(&[]),
            Err(RecommendError::InsufficientData(_))
        ));

        let single_user = vec![Interaction::new(1, 1, 3.0), Interaction::new(1, 2, 4.0)];
        assert!(matches!(
            ensure_trainable(&single_user),
            Err(RecommendError::InsufficientData(_))
        ));

        let single_product = vec![Interaction::new(1, 1, 3.0), Interaction::new(2, 1, 4.0)];
        assert!(matches!(
            ensure_trainable(&single_product),
            Err(RecommendError::InsufficientData(_))
        ));

        let ok = vec![Interaction::new(1, 1, 3.0), Interaction::new(2, 2, 4.0)];
        assert!(ensure_trainable(&ok).is_ok());
    }
}
