//! Example: recommendations for a small storefront
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example storefront_demo
//! ```

use anyhow::Result;
use storefront_recommender::{
    collaborative_filter, content_based_recommend, hybrid_recommend, Interaction, Product,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let interactions = vec![
        Interaction::new(1, 101, 5.0),
        Interaction::new(2, 101, 4.0),
        Interaction::new(1, 102, 3.0),
        Interaction::new(3, 103, 4.0),
        Interaction::new(2, 102, 5.0),
    ];

    let products = vec![
        Product::new(101, "This is a great product for outdoor activities."),
        Product::new(102, "High-quality product for indoor use."),
        Product::new(103, "A reliable product with excellent performance."),
        Product::new(104, "Affordable and durable product for everyday use."),
    ];

    println!("\n=== Collaborative filtering (user 1) ===");
    for rec in collaborative_filter(1, &interactions, 5)? {
        println!("  product {} -> {:.4}", rec.product_id, rec.score);
    }

    println!("\n=== Content-based (similar to 101) ===");
    for rec in content_based_recommend(101, &products, 5)? {
        println!("  product {} -> {:.4}", rec.product_id, rec.score);
    }

    println!("\n=== Hybrid (user 1, product 101) ===");
    for rec in hybrid_recommend(1, 101, &interactions, &products, 5)? {
        println!("  product {} -> {:.4}", rec.product_id, rec.score);
    }

    Ok(())
}
