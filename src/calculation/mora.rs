//! Mora (late-payment) accrual.
//!
//! A driver who carries a positive balance into the week without making a
//! qualifying payment is charged flat-rate interest per day of mora,
//! capped at one week. The mora-day count comes from the payments
//! collaborator and resets to zero on any partial payment.

use rust_decimal::Decimal;

use crate::config::MoraConfig;

use super::round_amount;

/// The result of a mora accrual computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoraCharge {
    /// The interest charged this cycle.
    pub amount: Decimal,
    /// The days actually billed, after the cap.
    pub days_applied: u8,
}

/// Computes the mora charge for one driver-week.
///
/// `round(prior_balance × flat_rate × min(mora_days, max_days))` when the
/// driver carries debt and made no qualifying payment; zero otherwise. A
/// negative prior balance is a credit and never accrues mora.
///
/// # Examples
///
/// ```
/// use fleet_billing::calculation::calculate_mora;
/// use fleet_billing::config::MoraConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = MoraConfig {
///     flat_rate: Decimal::from_str("0.015").unwrap(),
///     max_days: 7,
/// };
/// let charge = calculate_mora(Decimal::from(100000), 7, &config);
/// assert_eq!(charge.amount, Decimal::from(10500));
/// assert_eq!(charge.days_applied, 7);
/// ```
pub fn calculate_mora(prior_balance: Decimal, mora_days: u8, config: &MoraConfig) -> MoraCharge {
    if prior_balance <= Decimal::ZERO || mora_days == 0 {
        return MoraCharge {
            amount: Decimal::ZERO,
            days_applied: 0,
        };
    }

    let days_applied = mora_days.min(config.max_days);
    let amount = round_amount(prior_balance * config.flat_rate * Decimal::from(days_applied));

    MoraCharge {
        amount,
        days_applied,
    }
}
