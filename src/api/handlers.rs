//! HTTP API handlers.

use axum::{body::Bytes, Json};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;

/// Service name reported by `/`.
pub const SERVICE_NAME: &str = "DMIQ Core Service";
/// Service version reported by `/`.
pub const SERVICE_VERSION: &str = "1.0.0";
/// Short service identifier reported by `/health`.
pub const SERVICE_ID: &str = "dmiqcoresvc";

/// Fixture returned by every read of the data resource.
pub const SAMPLE_DATA: [SampleDataItem; 2] = [
    SampleDataItem {
        id: 1,
        name: "Sample 1",
    },
    SampleDataItem {
        id: 2,
        name: "Sample 2",
    },
];

/// Service info response.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    /// Service display name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Always "running".
    pub status: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Always "healthy".
    pub status: &'static str,
    /// Service identifier.
    pub service: &'static str,
}

/// API status response.
#[derive(Debug, Serialize)]
pub struct ApiStatus {
    /// API version.
    pub api_version: &'static str,
    /// Always "operational".
    pub status: &'static str,
}

/// One fixture item of the data resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleDataItem {
    /// Item id.
    pub id: u32,
    /// Item name.
    pub name: &'static str,
}

/// Data resource listing.
#[derive(Debug, Serialize)]
pub struct DataList {
    /// The fixture items, in order.
    pub data: &'static [SampleDataItem],
}

/// Acknowledgement of a write, echoing the payload.
#[derive(Debug, Serialize)]
pub struct DataReceived {
    /// Fixed acknowledgement message.
    pub message: &'static str,
    /// The payload exactly as submitted.
    pub received_data: Value,
}

/// Service info handler.
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        status: "running",
    })
}

/// Health check handler - always returns 200.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: SERVICE_ID,
    })
}

/// API status handler.
pub async fn api_status() -> Json<ApiStatus> {
    Json(ApiStatus {
        api_version: "v1",
        status: "operational",
    })
}

/// Data resource read handler.
pub async fn list_data() -> Json<DataList> {
    Json(DataList { data: &SAMPLE_DATA })
}

/// Data resource write handler. Nothing is stored; the payload is echoed.
pub async fn receive_data(body: Bytes) -> Result<Json<DataReceived>, ApiError> {
    let received_data = parse_submitted(&body)?;
    info!(bytes = body.len(), "data received");
    debug!(payload = %received_data, "received payload");

    Ok(Json(DataReceived {
        message: "Data received successfully",
        received_data,
    }))
}

/// Fallback for unmatched paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Decode a write-path body.
///
/// The body bytes decide, the `Content-Type` header is not consulted. An empty
/// body, whitespace, or the JSON literal `null` count as no data.
pub fn parse_submitted(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingBody);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidJson(e.to_string()))?;

    if value.is_null() {
        return Err(ApiError::MissingBody);
    }

    Ok(value)
}
