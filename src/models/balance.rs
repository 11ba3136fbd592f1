//! Driver balance ledger models.
//!
//! This module contains the [`DriverBalance`] ledger head and the
//! append-only [`BalanceMovement`] audit trail. By convention the head's
//! `current_balance` always equals the signed sum of the driver's
//! movements; every mutation goes through a movement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BillingWeek;

/// The direction of a balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Increases the driver's debt.
    Charge,
    /// Reduces the driver's debt.
    Credit,
}

/// One append-only entry in a driver's balance history.
///
/// # Example
///
/// ```
/// use fleet_billing::models::{BalanceMovement, MovementType};
/// use rust_decimal::Decimal;
///
/// let movement = BalanceMovement::new(
///     "drv_001",
///     MovementType::Charge,
///     Decimal::from(570000),
///     "weekly_billing",
///     "line-id",
/// );
/// assert_eq!(movement.signed_amount(), Decimal::from(570000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMovement {
    /// Unique identifier for the movement.
    pub id: Uuid,
    /// The driver the movement belongs to.
    pub driver_id: String,
    /// Whether the movement charges or credits the driver.
    pub movement_type: MovementType,
    /// The absolute amount moved. Always non-negative.
    pub amount: Decimal,
    /// The concept that produced the movement (e.g. "weekly_billing",
    /// "manual_adjustment", "settlement").
    pub concept: String,
    /// An external reference, typically the producing billing line id.
    pub reference: String,
    /// The billing week the movement belongs to, when produced by a run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<BillingWeek>,
    /// When the movement was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl BalanceMovement {
    /// Creates a movement stamped with the current time.
    pub fn new(
        driver_id: impl Into<String>,
        movement_type: MovementType,
        amount: Decimal,
        concept: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id: driver_id.into(),
            movement_type,
            amount: amount.abs(),
            concept: concept.into(),
            reference: reference.into(),
            week: None,
            occurred_at: Utc::now(),
        }
    }

    /// Attaches the producing billing week.
    pub fn for_week(mut self, week: BillingWeek) -> Self {
        self.week = Some(week);
        self
    }

    /// Returns the movement's contribution to the running balance:
    /// positive for charges, negative for credits.
    pub fn signed_amount(&self) -> Decimal {
        match self.movement_type {
            MovementType::Charge => self.amount,
            MovementType::Credit => -self.amount,
        }
    }
}

/// The ledger head: one row per driver.
///
/// Positive `current_balance` means the driver owes the operator; negative
/// means the driver holds a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverBalance {
    /// The driver this balance belongs to.
    pub driver_id: String,
    /// The running balance (positive = debt, negative = credit).
    pub current_balance: Decimal,
    /// Days since the carried balance was last serviced. Maintained by the
    /// payments collaborator; reset to zero on any partial payment.
    pub mora_days: u8,
    /// Lifetime mora charged against this driver.
    pub accrued_mora: Decimal,
    /// When the balance was last mutated.
    pub last_updated: DateTime<Utc>,
}

impl DriverBalance {
    /// Creates a zeroed balance for a driver.
    pub fn new(driver_id: impl Into<String>) -> Self {
        Self {
            driver_id: driver_id.into(),
            current_balance: Decimal::ZERO,
            mora_days: 0,
            accrued_mora: Decimal::ZERO,
            last_updated: Utc::now(),
        }
    }

    /// Applies a movement to the running balance.
    pub fn apply(&mut self, movement: &BalanceMovement) {
        self.current_balance += movement.signed_amount();
        self.last_updated = movement.occurred_at;
    }
}
