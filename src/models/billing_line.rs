//! Billing line models for the weekly billing engine.
//!
//! This module contains the [`BillingLine`] aggregate produced once per
//! driver per period, the per-concept [`BillingLineDetail`] rows, and the
//! [`ChargeConcept`] taxonomy shared by details and reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Modality;

/// The charge concept a billing line detail belongs to.
///
/// # Example
///
/// ```
/// use fleet_billing::models::ChargeConcept;
///
/// let concept = ChargeConcept::Rent;
/// assert_eq!(format!("{:?}", concept), "Rent");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeConcept {
    /// Weekly rent for the driver's modality, prorated by days billed.
    Rent,
    /// Guarantee-deposit installment.
    Guarantee,
    /// Kilometer-excess penalty.
    KmExcess,
    /// Toll pass-through charge.
    Toll,
    /// Administrative penalty pass-through.
    Penalty,
    /// Approved ticket credit in the driver's favor.
    TicketCredit,
    /// Late-payment interest on the carried balance.
    Mora,
    /// Guarantee refund issued on termination settlement.
    GuaranteeRefund,
}

/// Whether a billing line is a live projection or a committed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Computed against live facts without persistence.
    Preview,
    /// Persisted by a generation run.
    Committed,
}

/// The kind of source fact a detail row consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// An odometer-intake km-excess record.
    KmExcess,
    /// An approved ticket credit.
    TicketCredit,
    /// A toll or penalty pass-through charge.
    PassThrough,
}

/// Reference from a detail row back to the source fact it consumed.
///
/// The engine uses this to flip the `applied` flag on commit and to prove
/// that a fact was consumed by at most one billing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// The id of the consumed record.
    pub id: Uuid,
    /// What table the record lives in.
    pub kind: SourceKind,
}

/// One row per non-zero charge concept on a billing line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingLineDetail {
    /// Unique identifier for the detail row.
    pub id: Uuid,
    /// The billing line this detail belongs to.
    pub billing_line_id: Uuid,
    /// The charge concept.
    pub concept: ChargeConcept,
    /// Human-readable description of the charge.
    pub description: String,
    /// The number of units (days, installments, records).
    pub quantity: Decimal,
    /// The price per unit.
    pub unit_price: Decimal,
    /// The amount before tax.
    pub subtotal: Decimal,
    /// The amount including tax.
    pub total: Decimal,
    /// True when this row reduces the driver's debt.
    pub is_credit: bool,
    /// The source fact this row consumed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<SourceRef>,
}

/// The complete weekly charge breakdown for one driver.
///
/// Created once per driver per period; regeneration deletes and recreates
/// it and its detail rows (full replace, never merge).
///
/// # Invariants
///
/// - `0 <= days_billed <= 7` and `prorated_factor = days_billed / 7`.
/// - `net_charges = gross_charges - credits`.
/// - `total_due = net_charges + prior_balance + mora_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingLine {
    /// Unique identifier for the line.
    pub id: Uuid,
    /// The billing period this line belongs to.
    pub period_id: Uuid,
    /// The driver being billed.
    pub driver_id: String,
    /// The modality the line was billed under.
    pub modality: Modality,
    /// Days of the week the driver was billable (0-7).
    pub days_billed: u8,
    /// `days_billed / 7`, exact.
    pub prorated_factor: Decimal,
    /// The prorated rent charge.
    pub rent_amount: Decimal,
    /// The guarantee installment charge (zero once the deposit completes).
    pub guarantee_amount: Decimal,
    /// Sum of all charge details (rent, guarantee, km-excess, tolls,
    /// penalties, mora excluded).
    pub gross_charges: Decimal,
    /// Sum of all credit details.
    pub credits: Decimal,
    /// `gross_charges - credits`.
    pub net_charges: Decimal,
    /// The driver's balance carried in from previous periods.
    pub prior_balance: Decimal,
    /// Days of mora applied this cycle (capped at 7).
    pub mora_days: u8,
    /// The late-payment interest charged on the prior balance.
    pub mora_amount: Decimal,
    /// `net_charges + prior_balance + mora_amount`.
    pub total_due: Decimal,
    /// Whether the line is a preview projection or committed.
    pub status: LineStatus,
    /// True when a missing tariff concept forced a fallback constant.
    pub estimated: bool,
    /// True when a missing modality forced the lower-cost default.
    pub needs_review: bool,
}

impl BillingLine {
    /// Verifies the arithmetic invariants of the line.
    ///
    /// Returns `true` when the totals are internally consistent. The
    /// calculator always produces consistent lines; this exists for
    /// defence at the collaborator boundary and for tests.
    pub fn totals_consistent(&self) -> bool {
        self.net_charges == self.gross_charges - self.credits
            && self.total_due == self.net_charges + self.prior_balance + self.mora_amount
            && self.days_billed <= 7
            && self.prorated_factor == Decimal::from(self.days_billed) / Decimal::from(7)
    }
}
