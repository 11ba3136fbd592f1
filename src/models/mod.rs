//! Core data models for the weekly billing engine.
//!
//! This module contains all the domain models used throughout the engine.

mod balance;
mod billing_line;
mod billing_period;
mod driver;
mod guarantee;
mod settlement;
mod source_facts;

pub use balance::{BalanceMovement, DriverBalance, MovementType};
pub use billing_line::{
    BillingLine, BillingLineDetail, ChargeConcept, LineStatus, SourceKind, SourceRef,
};
pub use billing_period::{BillingPeriod, BillingWeek, PeriodStatus, PeriodTotals};
pub use driver::{DriverWeekAssignment, Modality};
pub use guarantee::{GuaranteeAccount, GuaranteeStatus};
pub use settlement::{SettlementStatus, TerminationSettlement};
pub use source_facts::{
    KmExcessRecord, PassThroughCharge, PassThroughKind, TicketCredit, TicketStatus,
};
