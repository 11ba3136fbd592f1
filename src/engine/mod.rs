//! Generation, settlement and storage orchestration.
//!
//! This module hosts everything around the pure calculator: the
//! [`BillingStore`] collaborator boundary, the configurable
//! [`DriverWeekSource`] selection strategies, the weekly generation and
//! preview runs, the period close/reopen operations and the termination
//! settlement lifecycle.

mod generation;
mod settlement;
mod source;
mod store;

pub use generation::{
    GenerationReport, PeriodPreview, PreviewedDriver, SkippedDriver, close_period,
    generate_period, preview_period, reopen_period,
};
pub use settlement::{approve_settlement, create_settlement};
pub use source::{DriverWeekSource, LiveAssignmentSource, WeeklyRosterSource, source_for};
pub use store::{BillingStore, MemoryStore};
