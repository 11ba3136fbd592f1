//! Request types for the billing API.
//!
//! This module defines the JSON request structures for the period and
//! settlement endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::BillingWeek;

/// Request body for the period endpoints (`generate`, `preview`,
/// `reopen`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekRequest {
    /// The ISO week number (1-53).
    pub week: u32,
    /// The ISO week-based year.
    pub year: i32,
}

impl WeekRequest {
    /// Converts the request into the engine's week type.
    pub fn billing_week(&self) -> BillingWeek {
        BillingWeek {
            week: self.week,
            year: self.year,
        }
    }
}

/// Request body for the `close` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosePeriodRequest {
    /// The ISO week number (1-53).
    pub week: u32,
    /// The ISO week-based year.
    pub year: i32,
    /// Who is closing the period.
    pub actor: String,
}

impl ClosePeriodRequest {
    /// Converts the request into the engine's week type.
    pub fn billing_week(&self) -> BillingWeek {
        BillingWeek {
            week: self.week,
            year: self.year,
        }
    }
}

/// Request body for creating a termination settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSettlementRequest {
    /// The driver being settled.
    pub driver_id: String,
    /// The last billable day.
    pub cutoff_date: NaiveDate,
}

/// Request body for approving a termination settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveSettlementRequest {
    /// The settlement to approve.
    pub settlement_id: Uuid,
    /// Who is approving the settlement.
    pub actor: String,
}
