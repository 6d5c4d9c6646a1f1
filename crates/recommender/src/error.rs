use actix_web::{HttpResponse, ResponseError};

use crate::types::ProductId;

pub type Result<T> = std::result::Result<T, RecommendError>;

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    /// Not enough rows to fit a model or compare products
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecommendError {
    /// Whether the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RecommendError::ProductNotFound(_) | RecommendError::InvalidInput(_)
        )
    }
}

impl ResponseError for RecommendError {
    fn error_response(&self) -> HttpResponse {
        if self.is_client_error() {
            tracing::warn!(error = %self, "rejected recommendation request");
        }

        match self {
            RecommendError::InsufficientData(_) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "error": "recommendations_unavailable",
                    "error_description": self.to_string()
                }))
            }
            RecommendError::ProductNotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "product_not_found",
                "error_description": self.to_string()
            })),
            RecommendError::InvalidInput(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_request",
                "error_description": self.to_string()
            })),
            RecommendError::Config(_) | RecommendError::Internal(_) => {
                tracing::error!(error = %self, "recommendation request failed");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "error_description": "Internal server error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                RecommendError::InsufficientData("empty".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (RecommendError::ProductNotFound(9), StatusCode::NOT_FOUND),
            (
                RecommendError::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RecommendError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.error_response().status(), status);
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(RecommendError::ProductNotFound(1).is_client_error());
        assert!(RecommendError::InvalidInput("x".into()).is_client_error());
        assert!(!RecommendError::InsufficientData("x".into()).is_client_error());
        assert!(!RecommendError::Internal("diverged".into()).is_client_error());
    }
}
