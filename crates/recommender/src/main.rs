//! Storefront Recommender - product recommendations over posted tables
//!
//! Port: 8082 (override with RECOMMENDER__SERVER__PORT)

use actix_web::{web, App, HttpServer};
use storefront_recommender::{server, RecommenderConfig, RecommenderEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = RecommenderConfig::load()?;
    let bind_addr = (config.server.host.clone(), config.server.port);
    let workers = config.server.workers;
    let max_payload_bytes = config.server.max_payload_bytes;

    info!(
        host = %bind_addr.0,
        port = bind_addr.1,
        solver = ?config.factorization.solver,
        normalization = ?config.hybrid.normalization,
        "Starting storefront recommender"
    );

    let state = web::Data::new(server::AppState::new(RecommenderEngine::new(config)));

    let mut http = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(max_payload_bytes))
            .configure(server::configure_routes)
    });
    if let Some(workers) = workers {
        http = http.workers(workers);
    }

    http.bind(bind_addr)?.run().await?;
    Ok(())
}
