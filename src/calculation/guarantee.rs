//! Guarantee installment charge calculation.
//!
//! This module computes the weekly guarantee-deposit installment: prorated
//! by days billed, clamped so the deposit never collects past its target,
//! and annotated once the account completes.

use rust_decimal::Decimal;

use crate::models::GuaranteeAccount;

use super::round_amount;

/// The result of computing one week's guarantee installment.
#[derive(Debug, Clone, PartialEq)]
pub struct GuaranteeCharge {
    /// The amount to charge this week. Zero once the deposit completed.
    pub amount: Decimal,
    /// True when the account has already reached its target.
    pub completed: bool,
    /// Human-readable description for the detail row.
    pub description: String,
}

/// Computes the guarantee installment for one driver-week.
///
/// - A `Completed` account charges zero but still yields a charge record
///   with a "completed" annotation, so reports can show cumulative
///   progress.
/// - An `InProgress` (or not-yet-created) account charges
///   `round(quota × factor)`, clamped to the amount still collectible so
///   the deposit never passes its target.
///
/// # Arguments
///
/// * `account` - The driver's guarantee account; `None` on the first
///   billable week, which charges like a fresh account
/// * `quota` - The per-installment quota for the driver's modality
/// * `total_installments` - The installment count fixed by the modality
/// * `factor` - The prorated day fraction for the week
///
/// # Examples
///
/// ```
/// use fleet_billing::calculation::guarantee_installment;
/// use rust_decimal::Decimal;
///
/// let charge = guarantee_installment(None, Decimal::from(50000), 20, Decimal::ONE);
/// assert_eq!(charge.amount, Decimal::from(50000));
/// assert!(!charge.completed);
/// ```
pub fn guarantee_installment(
    account: Option<&GuaranteeAccount>,
    quota: Decimal,
    total_installments: u32,
    factor: Decimal,
) -> GuaranteeCharge {
    if let Some(account) = account {
        if account.is_completed() {
            return GuaranteeCharge {
                amount: Decimal::ZERO,
                completed: true,
                description: format!(
                    "Guarantee deposit completed ({} of {} installments)",
                    account.installments_paid, account.total_installments
                ),
            };
        }
    }

    let raw = round_amount(quota * factor);
    let remaining = match account {
        Some(account) => account.remaining(quota),
        None => Decimal::from(total_installments) * quota,
    };
    let amount = raw.min(remaining);

    let paid_so_far = account.map_or(0, |a| a.installments_paid);
    GuaranteeCharge {
        amount,
        completed: false,
        description: format!(
            "Guarantee deposit installment {} of {}",
            paid_so_far + 1,
            account.map_or(total_installments, |a| a.total_installments)
        ),
    }
}
