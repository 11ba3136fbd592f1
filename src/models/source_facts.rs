//! Consumable source facts feeding the charge calculator.
//!
//! Km-excess records, ticket credits and toll/penalty pass-throughs are
//! produced by external intake processes; the engine only consumes them.
//! Each fact is consumed by at most one billing line, enforced by its
//! `applied` flag (checked before and set after consumption).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A kilometer-excess penalty record created by the odometer intake.
///
/// The tier, percentage and amounts are fixed at creation time; the weekly
/// billing run only sums unapplied records and flips `applied`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmExcessRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The driver who exceeded the allowance.
    pub driver_id: String,
    /// The period that consumed the record, once applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_id: Option<Uuid>,
    /// Kilometers over the contractual weekly base.
    pub km_over: u32,
    /// The tier label the excess fell into (e.g. "tier_b").
    pub bracket: String,
    /// The percentage-of-rent rate the tier fixed.
    pub percentage: Decimal,
    /// `round(weekly_rent × percentage)`.
    pub base_amount: Decimal,
    /// `round(base_amount × vat_rate)`.
    pub tax_amount: Decimal,
    /// `base_amount + tax_amount`.
    pub total_amount: Decimal,
    /// True once a billing line has consumed this record.
    pub applied: bool,
}

/// The review status of a ticket credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Submitted, awaiting review.
    Pending,
    /// Approved and eligible for the next billing run.
    Approved,
    /// Rejected by review; never billable.
    Rejected,
    /// Consumed by a billing line.
    Applied,
}

/// A credit in the driver's favor (e.g. a reimbursed repair ticket).
///
/// Only `Approved` credits are eligible; the engine flips them to
/// `Applied` and stamps the consuming period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCredit {
    /// Unique identifier for the credit.
    pub id: Uuid,
    /// The driver the credit favors.
    pub driver_id: String,
    /// The credit amount.
    pub amount: Decimal,
    /// The review status.
    pub status: TicketStatus,
    /// The period that consumed the credit, once applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_period_id: Option<Uuid>,
}

impl TicketCredit {
    /// Returns true if the credit can be consumed by a billing run.
    pub fn is_eligible(&self) -> bool {
        self.status == TicketStatus::Approved
    }
}

/// The kind of a pass-through charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughKind {
    /// A toll incurred by the vehicle, billed through to the driver.
    Toll,
    /// An administrative penalty billed through to the driver.
    Penalty,
}

/// A toll or penalty charged through to the driver at cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassThroughCharge {
    /// Unique identifier for the charge.
    pub id: Uuid,
    /// The driver being charged.
    pub driver_id: String,
    /// Toll or penalty.
    pub kind: PassThroughKind,
    /// Human-readable description of the charge.
    pub description: String,
    /// The amount charged through at cost.
    pub amount: Decimal,
    /// The period that consumed the charge, once applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_id: Option<Uuid>,
    /// True once a billing line has consumed this charge.
    pub applied: bool,
}
