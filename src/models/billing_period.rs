//! Billing period and week-window models.
//!
//! This module contains the [`BillingWeek`] calendar type, the
//! [`PeriodStatus`] lifecycle enum and the [`BillingPeriod`] aggregate that
//! governs whether (re)generation is permitted.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// An ISO week identifying one billing cycle.
///
/// The billing week runs Monday through Sunday. One billing period exists
/// per `(week, year)` pair, created lazily on first generation.
///
/// # Example
///
/// ```
/// use fleet_billing::models::BillingWeek;
/// use chrono::NaiveDate;
///
/// let week = BillingWeek { week: 32, year: 2025 };
/// assert_eq!(week.start_date(), NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
/// assert_eq!(week.end_date(), NaiveDate::from_ymd_opt(2025, 8, 10).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingWeek {
    /// The ISO week number (1-53).
    pub week: u32,
    /// The ISO week-based year.
    pub year: i32,
}

impl BillingWeek {
    /// Returns the billing week containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            week: iso.week(),
            year: iso.year(),
        }
    }

    /// Returns the Monday that starts this billing week.
    ///
    /// Falls back to the last valid ISO week of the year when the week
    /// number overflows (week 53 in a 52-week year).
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or_else(|| {
                NaiveDate::from_isoywd_opt(self.year, 52, Weekday::Mon)
                    .expect("week 52 exists in every ISO year")
            })
    }

    /// Returns the Sunday that ends this billing week (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.start_date() + chrono::Duration::days(6)
    }

    /// Checks if a given date falls within this billing week.
    ///
    /// The check is inclusive of both the Monday and the Sunday.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }
}

impl std::fmt::Display for BillingWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.week, self.year)
    }
}

/// The lifecycle state of a billing period.
///
/// `NotGenerated` is synthetic: no period row exists yet and the week is
/// computed on the fly. `Processing` is a transient guard entered at the
/// start of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// No generation has run for this week yet.
    NotGenerated,
    /// A generation run holds the period lock.
    Processing,
    /// Generated and open for recalculation or closing.
    Open,
    /// Closed; billing lines are immutable until reopened.
    Closed,
}

/// Aggregated totals for a billing period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Number of drivers with a committed billing line.
    pub driver_count: u32,
    /// Sum of gross charges across committed lines.
    pub charges: Decimal,
    /// Sum of credits across committed lines.
    pub credits: Decimal,
    /// Net amount (`charges - credits`).
    pub net: Decimal,
}

/// The weekly billing period aggregate.
///
/// Governs the generation lifecycle: `NotGenerated → Processing → Open →
/// Closed`, with `Closed → Open` (reopen) and `Open → Processing`
/// (recalculate). The status field is the sole concurrency gate for
/// generation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// Unique identifier for the period.
    pub id: Uuid,
    /// The ISO week this period bills.
    pub week: BillingWeek,
    /// The Monday this period starts on.
    pub start_date: NaiveDate,
    /// The Sunday this period ends on (inclusive).
    pub end_date: NaiveDate,
    /// The current lifecycle status.
    pub status: PeriodStatus,
    /// Aggregated totals from the last successful generation.
    pub totals: PeriodTotals,
    /// When the period was closed, if it is closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Who closed the period, if it is closed.
    pub closed_by: Option<String>,
}

impl BillingPeriod {
    /// Creates a fresh, not-yet-generated period for the given week.
    pub fn new(week: BillingWeek) -> Self {
        Self {
            id: Uuid::new_v4(),
            week,
            start_date: week.start_date(),
            end_date: week.end_date(),
            status: PeriodStatus::NotGenerated,
            totals: PeriodTotals::default(),
            closed_at: None,
            closed_by: None,
        }
    }

    /// Attempts the `NotGenerated/Open → Processing` transition.
    ///
    /// Generation is only permitted from `NotGenerated` or `Open`; a
    /// `Closed` period must be explicitly reopened first, and a period
    /// already `Processing` rejects the second run outright.
    pub fn begin_generation(&mut self) -> EngineResult<()> {
        match self.status {
            PeriodStatus::NotGenerated | PeriodStatus::Open => {
                self.status = PeriodStatus::Processing;
                Ok(())
            }
            PeriodStatus::Processing => Err(EngineError::PeriodLocked {
                week: self.week.week,
                year: self.week.year,
            }),
            PeriodStatus::Closed => Err(EngineError::PeriodClosed {
                week: self.week.week,
                year: self.week.year,
            }),
        }
    }

    /// Completes a generation run: `Processing → Open`, recording totals.
    ///
    /// Also used when the run only partially succeeded; the period is left
    /// `Open` with the totals of the committed drivers rather than being
    /// silently reverted.
    pub fn finish_generation(&mut self, totals: PeriodTotals) -> EngineResult<()> {
        if self.status != PeriodStatus::Processing {
            return Err(EngineError::InvalidPeriodTransition {
                week: self.week.week,
                year: self.week.year,
                message: format!("finish_generation from {:?}", self.status),
            });
        }
        self.status = PeriodStatus::Open;
        self.totals = totals;
        Ok(())
    }

    /// Closes an open period, stamping the timestamp and actor.
    pub fn close(&mut self, actor: &str, at: DateTime<Utc>) -> EngineResult<()> {
        if self.status != PeriodStatus::Open {
            return Err(EngineError::InvalidPeriodTransition {
                week: self.week.week,
                year: self.week.year,
                message: format!("close from {:?}", self.status),
            });
        }
        self.status = PeriodStatus::Closed;
        self.closed_at = Some(at);
        self.closed_by = Some(actor.to_string());
        Ok(())
    }

    /// Reopens a closed period, clearing the close timestamp and actor.
    pub fn reopen(&mut self) -> EngineResult<()> {
        if self.status != PeriodStatus::Closed {
            return Err(EngineError::InvalidPeriodTransition {
                week: self.week.week,
                year: self.week.year,
                message: format!("reopen from {:?}", self.status),
            });
        }
        self.status = PeriodStatus::Open;
        self.closed_at = None;
        self.closed_by = None;
        Ok(())
    }
}
