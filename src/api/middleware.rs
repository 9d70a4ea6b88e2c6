//! Response middleware shared by every route.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ApiError, ErrorBody};
use crate::metrics;

/// Rewrite non-JSON error responses into the JSON error envelope.
///
/// Covers responses produced by the framework itself: the default 405, and
/// extractor rejections such as 413. Status and headers (e.g. `Allow`) are
/// kept; only the body and its content headers change.
pub async fn json_error_envelope(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response;
    }

    let message = match status {
        StatusCode::NOT_FOUND => ApiError::NotFound.to_string(),
        StatusCode::METHOD_NOT_ALLOWED => ApiError::MethodNotAllowed.to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => ApiError::Internal(String::new()).to_string(),
        other => other.canonical_reason().unwrap_or("request failed").to_string(),
    };

    let (mut parts, _) = response.into_parts();
    let (_, body) = Json(ErrorBody::new(message)).into_response().into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, body)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Record request count and latency, labelled by the matched route.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(req).await;

    metrics::record_http_request(&method, &route, response.status().as_u16(), start);
    response
}
