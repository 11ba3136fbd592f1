//! Calculation logic for the weekly billing engine.
//!
//! This module contains all the calculation functions for determining a
//! driver's weekly charges, including day-fraction proration for partial
//! weeks, guarantee installment charges with their deposit cap, km-excess
//! tiered pricing, mora (late-payment) accrual, the single pure
//! driver-week calculator shared by the preview and commit paths, and the
//! termination settlement variant run at an arbitrary cutoff date.

mod driver_week;
mod guarantee;
mod km_excess;
mod mora;
mod proration;
mod settlement;

pub use driver_week::{
    ConsumedFacts, DriverWeekCalculation, DriverWeekFacts, PeriodWindow, calculate_driver_week,
};
pub use guarantee::{GuaranteeCharge, guarantee_installment};
pub use km_excess::{KmExcessPricing, build_km_excess_record, price_km_excess, sum_unapplied};
pub use mora::{MoraCharge, calculate_mora};
pub use proration::{DAYS_PER_WEEK, ProrationResult, prorate_window};
pub use settlement::{SettlementCalculation, calculate_settlement, guarantee_refund};

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to whole currency units.
///
/// The operator bills in whole pesos; every charge and credit passes
/// through this single helper so preview and commit can never disagree on
/// rounding.
///
/// # Example
///
/// ```
/// use fleet_billing::calculation::round_amount;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let raw = Decimal::from_str("297142.857142").unwrap();
/// assert_eq!(round_amount(raw), Decimal::from(297143));
/// ```
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
