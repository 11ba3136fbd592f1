//! Termination settlement model.
//!
//! A settlement is the one-shot billing computation run when a driver's
//! assignment ends: the regular weekly calculation clipped at an arbitrary
//! cutoff date, plus a guarantee refund step.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BillingLine, BillingLineDetail};

/// The lifecycle status of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Computed and stored, awaiting approval.
    Draft,
    /// Approved: source facts consumed, driver deactivated. Irreversible.
    Approved,
}

/// A driver's final billing computation at termination.
///
/// Mirrors a [`BillingLine`] but is computed against a cutoff date rather
/// than a full week, and carries the guarantee refund owed back to the
/// driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationSettlement {
    /// Unique identifier for the settlement.
    pub id: Uuid,
    /// The driver being settled.
    pub driver_id: String,
    /// The last billable day.
    pub cutoff_date: NaiveDate,
    /// The final charge breakdown, clipped at the cutoff.
    pub line: BillingLine,
    /// Per-concept detail rows backing the line.
    pub details: Vec<BillingLineDetail>,
    /// The portion of the collected guarantee refunded to the driver.
    /// Always `0 <= guarantee_refund <= amount_paid`.
    pub guarantee_refund: Decimal,
    /// Draft or approved.
    pub status: SettlementStatus,
    /// When the settlement was computed.
    pub created_at: DateTime<Utc>,
    /// When the settlement was approved, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Who approved the settlement, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

impl TerminationSettlement {
    /// The net amount the settlement leaves on the driver's ledger:
    /// the final total due minus the guarantee refund.
    pub fn net_settlement(&self) -> Decimal {
        self.line.total_due - self.guarantee_refund
    }
}
