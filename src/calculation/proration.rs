//! Day-fraction proration for partial weeks.
//!
//! This module computes how many days of a billing window a driver's
//! assignment actually covers: new hires starting mid-week, terminations,
//! and modality changes all bill a fraction of the weekly tariff.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::DriverWeekAssignment;

/// The number of billable days in a full billing week.
pub const DAYS_PER_WEEK: u8 = 7;

/// The result of prorating an assignment against a billing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProrationResult {
    /// Days of the window covered by the assignment (0-7).
    pub days_billed: u8,
    /// `days_billed / 7`, exact.
    pub factor: Decimal,
}

/// Intersects an assignment's active date range with a billing window.
///
/// Open-ended sides of the assignment extend to the window edge. The
/// result is clipped to `[0, 7]` days and the factor is the exact
/// fraction `days / 7`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidAssignment`] when the assignment's end
/// date precedes its start date.
///
/// # Examples
///
/// ```
/// use fleet_billing::calculation::prorate_window;
/// use fleet_billing::models::{DriverWeekAssignment, Modality};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let assignment = DriverWeekAssignment {
///     driver_id: "drv_001".to_string(),
///     vehicle_plate: "XYZ123".to_string(),
///     modality: Some(Modality::FixedFee),
///     start_date: Some(NaiveDate::from_ymd_opt(2025, 8, 7).unwrap()),
///     end_date: None,
///     active: true,
/// };
///
/// // Week 32/2025 runs Mon 2025-08-04 to Sun 2025-08-10; starting on
/// // Thursday leaves 4 billable days.
/// let result = prorate_window(
///     &assignment,
///     NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
/// ).unwrap();
/// assert_eq!(result.days_billed, 4);
/// assert_eq!(result.factor, Decimal::from(4) / Decimal::from(7));
/// ```
pub fn prorate_window(
    assignment: &DriverWeekAssignment,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> EngineResult<ProrationResult> {
    if let (Some(start), Some(end)) = (assignment.start_date, assignment.end_date) {
        if end < start {
            return Err(EngineError::InvalidAssignment {
                driver_id: assignment.driver_id.clone(),
                message: format!("end date {} precedes start date {}", end, start),
            });
        }
    }

    let effective_start = assignment
        .start_date
        .map_or(window_start, |s| s.max(window_start));
    let effective_end = assignment.end_date.map_or(window_end, |e| e.min(window_end));

    let days_billed = if effective_end < effective_start {
        0
    } else {
        let days = (effective_end - effective_start).num_days() + 1;
        days.clamp(0, i64::from(DAYS_PER_WEEK)) as u8
    };

    Ok(ProrationResult {
        days_billed,
        factor: Decimal::from(days_billed) / Decimal::from(DAYS_PER_WEEK),
    })
}
