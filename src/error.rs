//! Error types for the Weekly Driver Billing Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during billing generation.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the billing engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use fleet_billing::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/catalog.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/catalog.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The billing period is currently being generated by another run.
    ///
    /// The period status is the sole concurrency gate; a second generation
    /// request for the same week is rejected, never interleaved.
    #[error("Billing period {week}/{year} is locked by a generation in progress")]
    PeriodLocked {
        /// The ISO week number of the locked period.
        week: u32,
        /// The year of the locked period.
        year: i32,
    },

    /// The billing period is closed and must be reopened before mutation.
    #[error("Billing period {week}/{year} is closed; reopen it before regenerating")]
    PeriodClosed {
        /// The ISO week number of the closed period.
        week: u32,
        /// The year of the closed period.
        year: i32,
    },

    /// A period lifecycle transition was requested from the wrong state.
    #[error("Invalid period transition for {week}/{year}: {message}")]
    InvalidPeriodTransition {
        /// The ISO week number of the period.
        week: u32,
        /// The year of the period.
        year: i32,
        /// A description of the rejected transition.
        message: String,
    },

    /// No billing period exists for the requested week.
    #[error("No billing period exists for week {week}/{year}")]
    PeriodNotFound {
        /// The ISO week number requested.
        week: u32,
        /// The year requested.
        year: i32,
    },

    /// A driver's assignment data was malformed.
    ///
    /// Isolated per driver: the offending driver is skipped and reported,
    /// the rest of the batch proceeds.
    #[error("Invalid assignment for driver '{driver_id}': {message}")]
    InvalidAssignment {
        /// The driver whose assignment is malformed.
        driver_id: String,
        /// A description of what made the assignment invalid.
        message: String,
    },

    /// A computed amount went negative where the arithmetic forbids it.
    ///
    /// This is a programming-invariant violation, not a user error; it
    /// aborts the driver's line without aborting the whole batch.
    #[error("Negative {concept} amount computed for driver '{driver_id}': {amount}")]
    NegativeAmount {
        /// The driver whose line was aborted.
        driver_id: String,
        /// The charge concept that went negative.
        concept: String,
        /// The offending value.
        amount: String,
    },

    /// A km-excess record was edited or deleted after being applied.
    #[error("Km-excess record {record_id} is already applied and cannot be modified")]
    KmExcessApplied {
        /// The id of the applied record.
        record_id: String,
    },

    /// No driver balance or roster entry was found where one is required.
    #[error("Driver not found: {driver_id}")]
    DriverNotFound {
        /// The unknown driver id.
        driver_id: String,
    },

    /// No settlement exists with the requested id.
    #[error("Settlement not found: {settlement_id}")]
    SettlementNotFound {
        /// The unknown settlement id.
        settlement_id: String,
    },

    /// A termination settlement operation was invalid.
    #[error("Invalid settlement for driver '{driver_id}': {message}")]
    InvalidSettlement {
        /// The driver the settlement belongs to.
        driver_id: String,
        /// A description of the rejected operation.
        message: String,
    },

    /// The settlement cutoff date falls outside the billing week.
    #[error("Cutoff date {cutoff} is outside billing week {week}/{year}")]
    CutoffOutOfRange {
        /// The requested cutoff date.
        cutoff: NaiveDate,
        /// The ISO week number of the billing week.
        week: u32,
        /// The year of the billing week.
        year: i32,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
