//! Termination settlement calculation.
//!
//! The one-shot variant of the driver-week calculator: the billing window
//! is clipped at an arbitrary cutoff date instead of running the full
//! week, and a guarantee refund step returns deposit money the final
//! balance does not consume.

use rust_decimal::Decimal;

use crate::config::TariffCatalog;
use crate::error::EngineResult;
use crate::models::LineStatus;

use super::{DriverWeekCalculation, DriverWeekFacts, PeriodWindow, calculate_driver_week};

/// The output of a settlement calculation.
#[derive(Debug, Clone)]
pub struct SettlementCalculation {
    /// The final charge breakdown, clipped at the cutoff.
    pub calculation: DriverWeekCalculation,
    /// The guarantee refund owed back to the driver.
    pub refund: Decimal,
}

/// Computes the guarantee refund for a final balance.
///
/// - Final credit (`total_due < 0`) with collected guarantee: refund
///   covers the credit up to what was collected.
/// - Final debt smaller than the collected guarantee: refund the surplus.
/// - Otherwise nothing is refunded.
///
/// The result always satisfies `0 <= refund <= amount_paid`.
///
/// # Examples
///
/// ```
/// use fleet_billing::calculation::guarantee_refund;
/// use rust_decimal::Decimal;
///
/// // Driver leaves with a 20,000 credit and 50,000 of guarantee collected.
/// let refund = guarantee_refund(Decimal::from(-20000), Decimal::from(50000));
/// assert_eq!(refund, Decimal::from(20000));
/// ```
pub fn guarantee_refund(total_due: Decimal, amount_paid: Decimal) -> Decimal {
    if amount_paid <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if total_due < Decimal::ZERO {
        amount_paid.min(-total_due)
    } else if amount_paid > total_due {
        amount_paid - total_due
    } else {
        Decimal::ZERO
    }
}

/// Calculates a driver's termination settlement.
///
/// Runs the same pure calculator as the weekly path against a window
/// clipped at the cutoff date, then computes the guarantee refund from
/// the resulting total and the account's collected amount.
pub fn calculate_settlement(
    facts: &DriverWeekFacts,
    window: &PeriodWindow,
    catalog: &TariffCatalog,
) -> EngineResult<SettlementCalculation> {
    let calculation = calculate_driver_week(facts, window, catalog, LineStatus::Committed)?;

    let amount_paid = facts
        .guarantee
        .as_ref()
        .map_or(Decimal::ZERO, |account| account.amount_paid);
    // The final week's own guarantee installment is part of total_due and
    // not yet inside amount_paid, so the refund is computed against the
    // collected amount as of the cutoff.
    let refund = guarantee_refund(calculation.line.total_due, amount_paid);

    Ok(SettlementCalculation {
        calculation,
        refund,
    })
}
