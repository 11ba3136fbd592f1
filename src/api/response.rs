//! Response types for the billing API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::ConfigNotFound { path } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Tariff catalog unavailable",
                    format!("Configuration file not found: {}", path),
                ),
            },
            EngineError::ConfigParseError { path, message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Tariff catalog unavailable",
                    format!("Failed to parse {}: {}", path, message),
                ),
            },
            EngineError::PeriodLocked { week, year } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "PERIOD_LOCKED",
                    format!("Billing period {}/{} is locked", week, year),
                    "A generation run is already in progress for this period",
                ),
            },
            EngineError::PeriodClosed { week, year } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "PERIOD_CLOSED",
                    format!("Billing period {}/{} is closed", week, year),
                    "Reopen the period before regenerating it",
                ),
            },
            EngineError::InvalidPeriodTransition {
                week,
                year,
                message,
            } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "INVALID_PERIOD_TRANSITION",
                    format!("Invalid transition for period {}/{}", week, year),
                    message,
                ),
            },
            EngineError::PeriodNotFound { week, year } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "PERIOD_NOT_FOUND",
                    format!("No billing period exists for week {}/{}", week, year),
                ),
            },
            EngineError::InvalidAssignment { driver_id, message } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "INVALID_ASSIGNMENT",
                    format!("Invalid assignment for driver '{}'", driver_id),
                    message,
                ),
            },
            EngineError::NegativeAmount {
                driver_id,
                concept,
                amount,
            } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "INVARIANT_VIOLATION",
                    format!("Negative {} amount for driver '{}'", concept, driver_id),
                    amount,
                ),
            },
            EngineError::KmExcessApplied { record_id } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new(
                    "KM_EXCESS_APPLIED",
                    format!("Km-excess record {} is already applied", record_id),
                ),
            },
            EngineError::DriverNotFound { driver_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "DRIVER_NOT_FOUND",
                    format!("Driver not found: {}", driver_id),
                ),
            },
            EngineError::SettlementNotFound { settlement_id } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    "SETTLEMENT_NOT_FOUND",
                    format!("Settlement not found: {}", settlement_id),
                ),
            },
            EngineError::InvalidSettlement { driver_id, message } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "INVALID_SETTLEMENT",
                    format!("Invalid settlement for driver '{}'", driver_id),
                    message,
                ),
            },
            EngineError::CutoffOutOfRange { cutoff, week, year } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new(
                    "CUTOFF_OUT_OF_RANGE",
                    format!(
                        "Cutoff date {} is outside billing week {}/{}",
                        cutoff, week, year
                    ),
                ),
            },
            EngineError::CalculationError { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new("CALCULATION_ERROR", message),
            },
        }
    }
}
