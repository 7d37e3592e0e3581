//! Request/response bodies and the HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use wms_domain::InventoryError;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OptimalSlotParams {
    pub material_type: String,
    pub shelf_id: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OperationIdResponse {
    pub operation_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub operation_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Wrapper so `?` works in handlers. Carries the taxonomy's human-readable
/// message to the client; wrapped causes are logged server-side only.
pub struct ApiError(pub InventoryError);

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InventoryError::Validation { .. } => StatusCode::BAD_REQUEST,
            InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
            InventoryError::Conflict { .. } => StatusCode::CONFLICT,
            InventoryError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self.0 {
            InventoryError::Internal { .. } => error!(error = ?self.0, "request failed"),
            _ => warn!(kind = self.0.kind(), error = %self.0, "request rejected"),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
