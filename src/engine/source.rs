//! Driver-selection strategies for a generation run.
//!
//! The operator historically billed from two different sources of truth:
//! the live assignment windows, or a separate weekly roster-control table.
//! Both are modeled explicitly as [`DriverWeekSource`] implementations and
//! selected by catalog configuration, never by branch logic scattered
//! through the run.

use crate::config::SourceStrategy;
use crate::models::{BillingWeek, DriverWeekAssignment};

use super::store::BillingStore;

/// A strategy for deciding which drivers are billable in a week.
pub trait DriverWeekSource: Send + Sync {
    /// Returns the assignments to bill for the given week.
    fn billable_drivers(
        &self,
        store: &dyn BillingStore,
        week: BillingWeek,
    ) -> Vec<DriverWeekAssignment>;
}

/// Bills every active assignment whose window overlaps the billing week.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveAssignmentSource;

impl DriverWeekSource for LiveAssignmentSource {
    fn billable_drivers(
        &self,
        store: &dyn BillingStore,
        week: BillingWeek,
    ) -> Vec<DriverWeekAssignment> {
        let start = week.start_date();
        let end = week.end_date();
        store
            .live_assignments()
            .into_iter()
            .filter(|a| a.active && a.overlaps(start, end))
            .collect()
    }
}

/// Bills exactly the entries of the weekly roster-control table.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyRosterSource;

impl DriverWeekSource for WeeklyRosterSource {
    fn billable_drivers(
        &self,
        store: &dyn BillingStore,
        week: BillingWeek,
    ) -> Vec<DriverWeekAssignment> {
        store.weekly_roster(week)
    }
}

/// Resolves the configured strategy to its implementation.
pub fn source_for(strategy: SourceStrategy) -> &'static dyn DriverWeekSource {
    match strategy {
        SourceStrategy::LiveAssignments => &LiveAssignmentSource,
        SourceStrategy::WeeklyRoster => &WeeklyRosterSource,
    }
}
