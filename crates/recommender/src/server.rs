//! HTTP surface for the recommendation engine
//!
//! Stateless: each request posts the interaction and product tables it wants
//! scored. Training runs on actix's blocking pool.

use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info_span;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::RecommendError;
use crate::types::{Interaction, Product, ProductId, RecommendationMethod, UserId};
use crate::{RecommendationRequest, RecommenderEngine};

/// Application state shared across all handlers
pub struct AppState {
    pub engine: Arc<RecommenderEngine>,
}

impl AppState {
    pub fn new(engine: RecommenderEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Query string of the recommendations endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub method: Option<String>,
    pub product_id: Option<ProductId>,
    pub limit: Option<usize>,
}

/// Tables to score, supplied by the caller
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecommendationPayload {
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Recommendation joined with its catalog record
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendedProduct {
    pub product_id: ProductId,
    pub score: f64,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    pub user_id: UserId,
    pub method: RecommendationMethod,
    pub recommendations: Vec<RecommendedProduct>,
    pub generated_at: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Format a price for display, e.g. `12.5` → `"$12.50"`
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "storefront-recommender".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/v1/recommendations/{user_id}?method=&product_id=&limit=
async fn recommendations(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
    query: web::Query<RecommendationQuery>,
    payload: web::Json<RecommendationPayload>,
) -> Result<HttpResponse, RecommendError> {
    let user_id = path.into_inner();
    let query = query.into_inner();
    let payload = payload.into_inner();

    let request_id = Uuid::new_v4();
    let method = RecommendationMethod::from_param(query.method.as_deref());
    let top_n = state.engine.config().resolve_top_n(query.limit);
    let span = info_span!("recommendations", %request_id, user_id, %method);

    let engine = Arc::clone(&state.engine);
    let (recommendations, payload) = web::block(move || {
        span.in_scope(|| {
            let request = RecommendationRequest {
                user_id,
                reference_product: query.product_id,
                method,
                interactions: &payload.interactions,
                products: &payload.products,
                top_n,
            };
            engine
                .recommend(&request)
                .map(|recommendations| (recommendations, payload))
        })
    })
    .await
    .map_err(|e| RecommendError::Internal(e.to_string()))??;

    let catalog = Catalog::new(&payload.products)?;
    let recommendations = recommendations
        .into_iter()
        .map(|rec| {
            let product = catalog.get(rec.product_id);
            RecommendedProduct {
                product_id: rec.product_id,
                score: rec.score,
                description: product.map(|p| p.description.clone()),
                price: product.map(|p| format_price(p.price)),
                image: product.and_then(|p| p.image.clone()),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(RecommendationResponse {
        request_id,
        user_id,
        method,
        recommendations,
        generated_at: Utc::now(),
    }))
}

/// Configure application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1").route(
            "/recommendations/{user_id}",
            web::post().to(recommendations),
        ),
    );
}
