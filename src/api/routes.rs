//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};

use super::handlers::{api_status, health, index, list_data, not_found, receive_data};
use super::middleware::json_error_envelope;

/// Create the API router.
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(index))
        // Health endpoint
        .route("/health", get(health))
        // Versioned API
        .route("/api/v1/status", get(api_status))
        .route("/api/v1/data", get(list_data).post(receive_data))
        .fallback(not_found)
        .layer(middleware::map_response(json_error_envelope))
}
