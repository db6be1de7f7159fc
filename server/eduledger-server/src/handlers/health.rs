use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{api_success, ApiResponse};

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system health status
    #[schema(example = "healthy")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    /// API version
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Basic liveness check
pub async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    Json(api_success(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
