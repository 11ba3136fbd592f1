//! Guarantee deposit account model.
//!
//! This module defines the [`GuaranteeAccount`] that tracks a driver's
//! progress toward the refundable security deposit, collected in weekly
//! installments and capped at a fixed target.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Modality;

/// The lifecycle status of a guarantee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuaranteeStatus {
    /// Installments are still being collected.
    InProgress,
    /// The deposit target has been reached; no further charges.
    Completed,
}

/// A driver's guarantee deposit account.
///
/// Created on the driver's first billable week. The installment counter
/// advances once per successful billing run; the status flips to
/// `Completed` the instant `amount_paid` reaches the target or the
/// installment counter reaches its cap, whichever triggers first.
///
/// # Example
///
/// ```
/// use fleet_billing::models::{GuaranteeAccount, GuaranteeStatus, Modality};
/// use rust_decimal::Decimal;
///
/// let quota = Decimal::from(50000);
/// let mut account = GuaranteeAccount::new("drv_001", Modality::FixedFee, 20);
/// account.advance(quota, quota);
/// assert_eq!(account.installments_paid, 1);
/// assert_eq!(account.status, GuaranteeStatus::InProgress);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeAccount {
    /// The driver this account belongs to.
    pub driver_id: String,
    /// The modality the quota was fixed under.
    pub modality: Modality,
    /// The number of installments needed to complete the deposit.
    pub total_installments: u32,
    /// How many installments have been charged so far.
    pub installments_paid: u32,
    /// The amount collected so far. Monotonically non-decreasing.
    pub amount_paid: Decimal,
    /// Whether the deposit is still being collected.
    pub status: GuaranteeStatus,
}

impl GuaranteeAccount {
    /// Creates a fresh account with nothing collected.
    pub fn new(driver_id: impl Into<String>, modality: Modality, total_installments: u32) -> Self {
        Self {
            driver_id: driver_id.into(),
            modality,
            total_installments,
            installments_paid: 0,
            amount_paid: Decimal::ZERO,
            status: GuaranteeStatus::InProgress,
        }
    }

    /// The deposit target for the given per-installment quota.
    pub fn target(&self, quota: Decimal) -> Decimal {
        Decimal::from(self.total_installments) * quota
    }

    /// The amount still collectible before the target is reached.
    ///
    /// Never negative, even if rounding pushed `amount_paid` to the target
    /// early.
    pub fn remaining(&self, quota: Decimal) -> Decimal {
        let remaining = self.target(quota) - self.amount_paid;
        if remaining < Decimal::ZERO {
            Decimal::ZERO
        } else {
            remaining
        }
    }

    /// Returns true once the deposit is fully collected.
    pub fn is_completed(&self) -> bool {
        self.status == GuaranteeStatus::Completed
    }

    /// Advances the account after a successful billing run.
    ///
    /// `charged` is the amount the run actually collected (already clamped
    /// to [`Self::remaining`] by the calculator). Flips to `Completed` when
    /// either trigger fires.
    pub fn advance(&mut self, charged: Decimal, quota: Decimal) {
        if self.is_completed() || charged <= Decimal::ZERO {
            return;
        }
        self.installments_paid += 1;
        self.amount_paid += charged;
        if self.amount_paid >= self.target(quota) || self.installments_paid >= self.total_installments
        {
            self.status = GuaranteeStatus::Completed;
        }
    }

    /// Rolls back one advance when its billing run is regenerated.
    ///
    /// A regeneration replaces the prior run's installment rather than
    /// stacking a second one on top of it; across committed runs the
    /// collected amount still only moves forward.
    pub fn revert(&mut self, charged: Decimal, quota: Decimal) {
        if charged <= Decimal::ZERO {
            return;
        }
        self.installments_paid = self.installments_paid.saturating_sub(1);
        self.amount_paid -= charged;
        if self.amount_paid < Decimal::ZERO {
            self.amount_paid = Decimal::ZERO;
        }
        if self.amount_paid >= self.target(quota) || self.installments_paid >= self.total_installments
        {
            self.status = GuaranteeStatus::Completed;
        } else {
            self.status = GuaranteeStatus::InProgress;
        }
    }
}
