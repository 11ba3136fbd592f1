//! Driver and assignment models.
//!
//! This module defines the [`DriverWeekAssignment`] struct and [`Modality`] enum
//! for representing billable drivers in the weekly billing engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Represents the rental class a driver is billed under.
///
/// The modality selects the weekly rent tariff and the guarantee-deposit
/// quota used by the charge calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Fixed weekly rent regardless of shifts driven.
    FixedFee,
    /// Per-shift billing with a lower weekly base.
    ShiftBased,
}

/// Represents a driver's assignment window for billing purposes.
///
/// The assignment is owned by the roster subsystem; the engine only reads
/// it to decide which drivers are billable in a given week and at what
/// daily rate class.
///
/// # Example
///
/// ```
/// use fleet_billing::models::{DriverWeekAssignment, Modality};
/// use chrono::NaiveDate;
///
/// let assignment = DriverWeekAssignment {
///     driver_id: "drv_001".to_string(),
///     vehicle_plate: "XYZ123".to_string(),
///     modality: Some(Modality::FixedFee),
///     start_date: Some(NaiveDate::from_ymd_opt(2025, 8, 4).unwrap()),
///     end_date: None,
///     active: true,
/// };
/// assert!(assignment.active);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverWeekAssignment {
    /// Unique identifier for the driver.
    pub driver_id: String,
    /// The plate of the vehicle assigned to the driver.
    pub vehicle_plate: String,
    /// The rental modality; `None` when the roster record is incomplete,
    /// in which case the calculator falls back to the lower-cost modality
    /// and flags the line for manual review.
    pub modality: Option<Modality>,
    /// The first day of the assignment, if bounded.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// The last day of the assignment, if bounded.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Whether the assignment is currently active. Settlement approval
    /// deactivates it.
    pub active: bool,
}

impl DriverWeekAssignment {
    /// Returns true if the assignment window overlaps the given date range.
    ///
    /// Open-ended sides of the assignment extend indefinitely in that
    /// direction.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        let begins_before_end = self.start_date.is_none_or(|s| s <= end);
        let ends_after_start = self.end_date.is_none_or(|e| e >= start);
        begins_before_end && ends_after_start
    }
}
