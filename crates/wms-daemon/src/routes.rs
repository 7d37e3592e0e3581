//! Axum router and all HTTP handlers for wms-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers afterwards so the scenario tests in `tests/` can drive
//! the bare router in-process.

use std::future::Future;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use wms_coordinator::{MoveMaterial, PlaceMaterial, RemoveMaterial, ReserveSlots};
use wms_domain::InventoryError;

use crate::api_types::{
    ApiError, HealthResponse, OperationIdResponse, OptimalSlotParams, PageParams,
    ReservationResponse, SearchParams,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/materials/place", post(place_material))
        .route("/api/v1/materials/remove", post(remove_material))
        .route("/api/v1/materials/move", post(move_material))
        .route("/api/v1/materials/batch-place", post(batch_place_materials))
        .route("/api/v1/materials/search", get(search_materials))
        .route("/api/v1/slots/reserve", post(reserve_slots))
        .route("/api/v1/slots/optimal", get(find_optimal_slot))
        .route("/api/v1/shelves/:shelf_id/status", get(get_shelf_status))
        .route("/api/v1/shelves/:shelf_id/health", get(health_check_shelf))
        .route("/api/v1/operations", get(get_operations))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Run a coordinator call, recording count + latency per command.
async fn timed<T, F>(state: &AppState, command: &str, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, InventoryError>>,
{
    let start = Instant::now();
    let result = fut.await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    state
        .metrics
        .observe(command, outcome, start.elapsed().as_secs_f64());
    result.map_err(ApiError)
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

async fn place_material(
    State(st): State<AppState>,
    Json(cmd): Json<PlaceMaterial>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = timed(&st, "place_material", st.coordinator.place_material(cmd)).await?;
    Ok(Json(receipt))
}

async fn remove_material(
    State(st): State<AppState>,
    Json(cmd): Json<RemoveMaterial>,
) -> Result<impl IntoResponse, ApiError> {
    let operation_id = timed(&st, "remove_material", st.coordinator.remove_material(cmd)).await?;
    Ok(Json(OperationIdResponse { operation_id }))
}

async fn move_material(
    State(st): State<AppState>,
    Json(cmd): Json<MoveMaterial>,
) -> Result<impl IntoResponse, ApiError> {
    let operation_id = timed(&st, "move_material", st.coordinator.move_material(cmd)).await?;
    Ok(Json(OperationIdResponse { operation_id }))
}

async fn batch_place_materials(
    State(st): State<AppState>,
    Json(commands): Json<Vec<PlaceMaterial>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = timed(
        &st,
        "batch_place_materials",
        st.coordinator.batch_place_materials(commands),
    )
    .await?;
    Ok(Json(outcome))
}

async fn search_materials(
    State(st): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let materials = timed(
        &st,
        "search_materials",
        st.coordinator
            .search_materials(&params.q, params.limit, params.offset),
    )
    .await?;
    Ok(Json(materials))
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

async fn reserve_slots(
    State(st): State<AppState>,
    Json(cmd): Json<ReserveSlots>,
) -> Result<impl IntoResponse, ApiError> {
    let operation_ids = timed(&st, "reserve_slots", st.coordinator.reserve_slots(cmd)).await?;
    Ok(Json(ReservationResponse { operation_ids }))
}

async fn find_optimal_slot(
    State(st): State<AppState>,
    Query(params): Query<OptimalSlotParams>,
) -> Result<impl IntoResponse, ApiError> {
    let slot = timed(
        &st,
        "find_optimal_slot",
        st.coordinator
            .find_optimal_slot(&params.material_type, &params.shelf_id),
    )
    .await?;
    Ok(Json(slot))
}

// ---------------------------------------------------------------------------
// Shelves
// ---------------------------------------------------------------------------

async fn get_shelf_status(
    State(st): State<AppState>,
    Path(shelf_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = timed(
        &st,
        "get_shelf_status",
        st.coordinator.get_shelf_status(&shelf_id),
    )
    .await?;
    Ok(Json(summary))
}

async fn health_check_shelf(
    State(st): State<AppState>,
    Path(shelf_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let health = timed(
        &st,
        "health_check_shelf",
        st.coordinator.health_check_shelf(&shelf_id),
    )
    .await?;
    Ok(Json(health))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

async fn get_operations(
    State(st): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let operations = timed(
        &st,
        "get_operations",
        st.coordinator.get_operations(params.limit, params.offset),
    )
    .await?;
    Ok(Json(operations))
}

// ---------------------------------------------------------------------------
// Service endpoints
// ---------------------------------------------------------------------------

async fn health(State(st): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

async fn metrics(State(st): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        st.metrics.render(),
    )
}
