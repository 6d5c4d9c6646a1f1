//! Behavioural properties of the three recommendation strategies

use storefront_recommender::{
    collaborative_filter, content_based_recommend, hybrid_recommend, merge_scores,
    CollaborativeFilter, FactorizationConfig, Interaction, Product, ProductId, RecommendError,
    Recommendation, Solver,
};
use std::collections::HashSet;

fn storefront_interactions() -> Vec<Interaction> {
    vec![
        Interaction::new(1, 101, 5.0),
        Interaction::new(2, 101, 4.0),
        Interaction::new(1, 102, 3.0),
        Interaction::new(3, 103, 4.0),
        Interaction::new(2, 102, 5.0),
    ]
}

fn storefront_products() -> Vec<Product> {
    vec![
        Product::new(101, "This is a great product for outdoor activities.").with_price(49.99),
        Product::new(102, "High-quality product for indoor use.").with_price(19.5),
        Product::new(103, "A reliable product with excellent performance.").with_price(99.0),
        Product::new(104, "Affordable and durable product for everyday use.").with_price(9.99),
    ]
}

/// Deterministic pseudo-random rating table: `users` × `products` with gaps
fn generated_interactions(users: i64, products: i64) -> Vec<Interaction> {
    let mut interactions = Vec::new();
    for user in 1..=users {
        for product in 1..=products {
            if (user * 7 + product * 3) % 4 != 0 {
                let rating = ((user * 13 + product * 5) % 5 + 1) as f64;
                interactions.push(Interaction::new(user, 1000 + product, rating));
            }
        }
    }
    interactions
}

#[test]
fn test_collaborative_respects_top_n_exclusion_and_order() {
    let interactions = generated_interactions(12, 15);

    for user in [1, 5, 12, 77] {
        for top_n in [0, 1, 3, 50] {
            let recs = collaborative_filter(user, &interactions, top_n).unwrap();

            assert!(recs.len() <= top_n);
            for rec in &recs {
                assert!(!interactions
                    .iter()
                    .any(|i| i.user_id == user && i.product_id == rec.product_id));
                assert!((1.0..=5.0).contains(&rec.score));
            }
            for pair in recs.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}

#[test]
fn test_collaborative_seeded_runs_are_reproducible() {
    let interactions = generated_interactions(8, 10);
    for solver in [Solver::Sgd, Solver::Als] {
        let engine = CollaborativeFilter::new(FactorizationConfig {
            latent_factors: 8,
            solver,
            ..FactorizationConfig::default()
        });

        let first = engine.recommend(3, &interactions, &[], 5).unwrap();
        let second = engine.recommend(3, &interactions, &[], 5).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_collaborative_single_user_is_insufficient() {
    let interactions = vec![
        Interaction::new(1, 101, 5.0),
        Interaction::new(1, 102, 3.0),
        Interaction::new(1, 103, 4.0),
    ];
    let result = collaborative_filter(1, &interactions, 5);
    assert!(matches!(result, Err(RecommendError::InsufficientData(_))));
}

#[test]
fn test_collaborative_rejects_out_of_scale_rating() {
    let mut interactions = storefront_interactions();
    interactions.push(Interaction::new(4, 104, 9.0));
    let result = collaborative_filter(1, &interactions, 5);
    assert!(matches!(result, Err(RecommendError::InvalidInput(_))));
}

#[test]
fn test_collaborative_divergence_is_reported_not_ranked() {
    let engine = CollaborativeFilter::new(FactorizationConfig {
        learning_rate: 5.0,
        ..FactorizationConfig::default()
    });

    let result = engine.recommend(1, &generated_interactions(6, 8), &[], 10);
    assert!(matches!(result, Err(RecommendError::Internal(_))));
}

#[test]
fn test_content_based_never_returns_reference() {
    let products = storefront_products();
    for product in &products {
        let recs = content_based_recommend(product.product_id, &products, 10).unwrap();
        assert_eq!(recs.len(), products.len() - 1);
        assert!(recs.iter().all(|r| r.product_id != product.product_id));
        assert!(recs.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    }
}

#[test]
fn test_content_based_is_bit_identical_across_calls() {
    let products = storefront_products();
    let first = content_based_recommend(101, &products, 3).unwrap();
    let second = content_based_recommend(101, &products, 3).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.product_id, b.product_id);
        assert_eq!(a.score.to_bits(), b.score.to_bits());
    }
}

#[test]
fn test_content_based_storefront_ranking() {
    // 101 and 103 share only "product" and both have four terms, so 103
    // has the shortest vector among the candidates and ranks first.
    let recs = content_based_recommend(101, &storefront_products(), 3).unwrap();
    assert_eq!(recs[0].product_id, 103);
    assert!(recs[0].score > recs[1].score);
    assert!(recs.iter().all(|r| r.score > 0.0));
}

#[test]
fn test_content_based_missing_reference() {
    let result = content_based_recommend(555, &storefront_products(), 3);
    assert!(matches!(result, Err(RecommendError::ProductNotFound(555))));
}

#[test]
fn test_hybrid_merge_example() {
    let collaborative = [Recommendation::new(101, 4.5), Recommendation::new(102, 3.0)];
    let content = [Recommendation::new(102, 0.8), Recommendation::new(103, 0.6)];

    let merged = merge_scores(&collaborative, &content, 3);
    let ids: Vec<_> = merged.iter().map(|r| r.product_id).collect();
    assert_eq!(ids, vec![101, 102, 103]);
    assert!((merged[0].score - 4.5).abs() < 1e-9);
    assert!((merged[1].score - 3.8).abs() < 1e-9);
    assert!((merged[2].score - 0.6).abs() < 1e-9);
}

#[test]
fn test_hybrid_storefront_scenario() {
    let interactions = storefront_interactions();
    let products = storefront_products();

    let recs = hybrid_recommend(1, 101, &interactions, &products, 2).unwrap();
    let again = hybrid_recommend(1, 101, &interactions, &products, 2).unwrap();

    assert_eq!(recs, again);
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.score.is_finite()));
    assert!(recs.iter().all(|r| r.product_id != 101 && r.product_id != 102));
    assert!(recs[0].score >= recs[1].score);
}

#[test]
fn test_hybrid_propagates_sub_strategy_errors() {
    let products = storefront_products();

    let single_user = vec![Interaction::new(1, 101, 5.0), Interaction::new(1, 102, 4.0)];
    assert!(matches!(
        hybrid_recommend(1, 101, &single_user, &products, 2),
        Err(RecommendError::InsufficientData(_))
    ));

    assert!(matches!(
        hybrid_recommend(1, 999, &storefront_interactions(), &products, 2),
        Err(RecommendError::ProductNotFound(999))
    ));
}

/// Outdoor gear table where the boots (202) trail the kettle (201) on ratings
/// and the matching boots (203) on text, so they only surface when both
/// sub-lists are longer than `top_n`.
fn gear_catalog() -> (Vec<Interaction>, Vec<Product>) {
    let mut interactions = Vec::new();
    for user in 1..=5 {
        interactions.push(Interaction::new(user, 200, 2.0));
        interactions.push(Interaction::new(user, 201, 5.0));
        interactions.push(Interaction::new(user, 202, if user == 5 { 4.0 } else { 5.0 }));
        interactions.push(Interaction::new(user, 203, 1.0));
        interactions.push(Interaction::new(user, 204, 3.0));
    }

    let products = vec![
        Product::new(200, "waterproof hiking boots leather"),
        Product::new(201, "stainless kitchen kettle"),
        Product::new(202, "waterproof hiking boots"),
        Product::new(203, "leather hiking boots waterproof"),
        Product::new(204, "ceramic coffee mug"),
    ];
    (interactions, products)
}

#[test]
fn test_hybrid_only_merges_top_n_of_each_strategy() {
    let (interactions, products) = gear_catalog();
    let catalog: Vec<ProductId> = products.iter().map(|p| p.product_id).collect();
    let collaborative = CollaborativeFilter::with_default_config();

    let content_top = content_based_recommend(200, &products, 1).unwrap();
    assert_eq!(content_top[0].product_id, 203);
    let content_longer = content_based_recommend(200, &products, 2).unwrap();
    assert_eq!(content_longer[1].product_id, 202);

    for top_n in 1..=3 {
        let collab = collaborative
            .recommend(99, &interactions, &catalog, top_n)
            .unwrap();
        let content = content_based_recommend(200, &products, top_n).unwrap();

        let recs = hybrid_recommend(99, 200, &interactions, &products, top_n).unwrap();
        assert_eq!(recs, merge_scores(&collab, &content, top_n));

        let allowed: HashSet<ProductId> = collab
            .iter()
            .chain(&content)
            .map(|r| r.product_id)
            .collect();
        assert!(recs.iter().all(|r| allowed.contains(&r.product_id)));
    }
}
