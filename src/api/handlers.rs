//! HTTP request handlers for the billing API.
//!
//! This module contains the handler functions for the period and
//! settlement endpoints. Each endpoint maps 1:1 to an engine operation;
//! no business logic lives here.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{
    approve_settlement, close_period, create_settlement, generate_period, preview_period,
    reopen_period,
};
use crate::error::EngineError;

use super::request::{
    ApproveSettlementRequest, ClosePeriodRequest, CreateSettlementRequest, WeekRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/periods/generate", post(generate_handler))
        .route("/periods/preview", post(preview_handler))
        .route("/periods/close", post(close_handler))
        .route("/periods/reopen", post(reopen_handler))
        .route("/settlements", post(create_settlement_handler))
        .route("/settlements/approve", post(approve_settlement_handler))
        .with_state(state)
}

/// Maps a JSON extraction rejection to an API error body.
fn rejection_error(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::new(
            "MISSING_CONTENT_TYPE",
            "Content-Type must be application/json",
        ),
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

/// Maps an engine error to its HTTP response.
fn engine_error(correlation_id: Uuid, error: EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %error, "operation failed");
    let response: ApiErrorResponse = error.into();
    response.into_response()
}

/// Handler for POST /periods/generate.
///
/// Runs (or re-runs) the weekly generation for the requested week and
/// returns the run report.
async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<WeekRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    let week = request.billing_week();
    info!(correlation_id = %correlation_id, week = %week, "generate period requested");

    match generate_period(state.store(), state.catalog(), week) {
        Ok(report) => {
            info!(
                correlation_id = %correlation_id,
                week = %week,
                drivers_processed = report.drivers_processed,
                drivers_skipped = report.drivers_skipped.len(),
                "generation completed"
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(error) => engine_error(correlation_id, error),
    }
}

/// Handler for POST /periods/preview.
///
/// Projects the week against live facts without persisting anything.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<WeekRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    let week = request.billing_week();
    info!(correlation_id = %correlation_id, week = %week, "preview period requested");

    match preview_period(state.store(), state.catalog(), week) {
        Ok(preview) => (StatusCode::OK, Json(preview)).into_response(),
        Err(error) => engine_error(correlation_id, error),
    }
}

/// Handler for POST /periods/close.
async fn close_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClosePeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    let week = request.billing_week();
    info!(correlation_id = %correlation_id, week = %week, "close period requested");

    match close_period(state.store(), week, &request.actor) {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(error) => engine_error(correlation_id, error),
    }
}

/// Handler for POST /periods/reopen.
async fn reopen_handler(
    State(state): State<AppState>,
    payload: Result<Json<WeekRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    let week = request.billing_week();
    info!(correlation_id = %correlation_id, week = %week, "reopen period requested");

    match reopen_period(state.store(), week) {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(error) => engine_error(correlation_id, error),
    }
}

/// Handler for POST /settlements.
///
/// Computes and stores a draft termination settlement.
async fn create_settlement_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateSettlementRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    info!(
        correlation_id = %correlation_id,
        driver_id = %request.driver_id,
        cutoff = %request.cutoff_date,
        "settlement draft requested"
    );

    match create_settlement(
        state.store(),
        state.catalog(),
        &request.driver_id,
        request.cutoff_date,
    ) {
        Ok(settlement) => (StatusCode::CREATED, Json(settlement)).into_response(),
        Err(error) => engine_error(correlation_id, error),
    }
}

/// Handler for POST /settlements/approve.
///
/// Approves a draft settlement; terminal and irreversible.
async fn approve_settlement_handler(
    State(state): State<AppState>,
    payload: Result<Json<ApproveSettlementRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(correlation_id, rejection),
    };

    info!(
        correlation_id = %correlation_id,
        settlement_id = %request.settlement_id,
        "settlement approval requested"
    );

    match approve_settlement(
        state.store(),
        state.catalog(),
        request.settlement_id,
        &request.actor,
    ) {
        Ok(settlement) => (StatusCode::OK, Json(settlement)).into_response(),
        Err(error) => engine_error(correlation_id, error),
    }
}
