//! The driver-week charge calculator.
//!
//! This module contains the single pure calculation shared by the preview
//! and commit paths: given a snapshot of one driver's facts for a billing
//! window, produce the complete [`BillingLine`] and its detail rows. The
//! two paths differ only in whether the result is persisted and source
//! facts are flagged as applied; the arithmetic lives here once.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::config::TariffCatalog;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BillingLine, BillingLineDetail, BillingWeek, ChargeConcept, DriverWeekAssignment,
    GuaranteeAccount, KmExcessRecord, LineStatus, PassThroughCharge, PassThroughKind, SourceKind,
    SourceRef, TicketCredit,
};

use super::{
    DAYS_PER_WEEK, calculate_mora, guarantee_installment, prorate_window, round_amount,
    sum_unapplied,
};

/// The billing window a calculation runs against.
///
/// For a weekly run this is the full Monday-Sunday week; for a
/// termination settlement the end is clipped at the cutoff date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    /// The period the resulting line belongs to.
    pub period_id: Uuid,
    /// The billing week.
    pub week: BillingWeek,
    /// First billable day (inclusive).
    pub start: NaiveDate,
    /// Last billable day (inclusive).
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// The full seven-day window for a billing week.
    pub fn full_week(period_id: Uuid, week: BillingWeek) -> Self {
        Self {
            period_id,
            week,
            start: week.start_date(),
            end: week.end_date(),
        }
    }

    /// A window clipped at a settlement cutoff date.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CutoffOutOfRange`] when the cutoff does not
    /// fall inside the billing week.
    pub fn clipped(period_id: Uuid, week: BillingWeek, cutoff: NaiveDate) -> EngineResult<Self> {
        if !week.contains_date(cutoff) {
            return Err(EngineError::CutoffOutOfRange {
                cutoff,
                week: week.week,
                year: week.year,
            });
        }
        Ok(Self {
            period_id,
            week,
            start: week.start_date(),
            end: cutoff,
        })
    }
}

/// A snapshot of one driver's facts for a billing window.
///
/// Assembled by the generation engine from the collaborator reads; the
/// calculator never touches storage.
#[derive(Debug, Clone)]
pub struct DriverWeekFacts {
    /// The driver's assignment window and modality.
    pub assignment: DriverWeekAssignment,
    /// The driver's guarantee account, if one exists yet.
    pub guarantee: Option<GuaranteeAccount>,
    /// The driver's unapplied km-excess records.
    pub km_excess: Vec<KmExcessRecord>,
    /// The driver's approved ticket credits.
    pub ticket_credits: Vec<TicketCredit>,
    /// The driver's unapplied toll/penalty pass-throughs.
    pub pass_through: Vec<PassThroughCharge>,
    /// The balance carried in from previous periods.
    pub prior_balance: Decimal,
    /// Days since the carried balance was serviced (0 = paid this cycle).
    pub mora_days: u8,
}

/// The source facts a calculation consumed, for the commit path to flip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumedFacts {
    /// Ids of consumed km-excess records.
    pub km_excess: Vec<Uuid>,
    /// Ids of consumed ticket credits.
    pub ticket_credits: Vec<Uuid>,
    /// Ids of consumed pass-through charges.
    pub pass_through: Vec<Uuid>,
}

/// The complete output of one driver-week calculation.
#[derive(Debug, Clone)]
pub struct DriverWeekCalculation {
    /// The aggregated billing line.
    pub line: BillingLine,
    /// One detail row per non-zero concept.
    pub details: Vec<BillingLineDetail>,
    /// The guarantee amount actually charged, for the tracker advance.
    pub guarantee_charged: Decimal,
    /// The per-installment quota the charge was computed from.
    pub guarantee_quota: Decimal,
    /// The installment count for creating the account on first billing.
    pub guarantee_installments: u32,
    /// The source facts the commit path must flip to applied.
    pub consumed: ConsumedFacts,
}

/// Calculates the complete charge breakdown for one driver-week.
///
/// Pure given its snapshot: the same facts, window and catalog always
/// yield the same amounts. Both the preview and the commit path call this
/// function; nothing here mutates storage.
///
/// # Algorithm
///
/// 1. Intersect the assignment with the window, clipped to `[0, 7]` days.
/// 2. Rent: `round(weekly_rent × days/7)`.
/// 3. Guarantee: prorated quota, clamped at the deposit target; zero with
///    a "completed" annotation once the account completes.
/// 4. Km-excess: sum the unapplied records (amounts frozen at intake).
/// 5. Pass-throughs: sum unapplied tolls and penalties at cost.
/// 6. Credits: sum the approved ticket credits.
/// 7. Mora: flat rate on a positive carried balance, capped at 7 days.
///
/// # Failure modes
///
/// - Missing tariff concept: the documented fallback constants price the
///   line and it is flagged `estimated`.
/// - Missing modality: the lower-cost modality is used and the line is
///   flagged `needs_review`.
/// - A negative computed amount is a programming-invariant violation: the
///   driver's line is aborted with [`EngineError::NegativeAmount`] without
///   aborting the rest of the batch.
pub fn calculate_driver_week(
    facts: &DriverWeekFacts,
    window: &PeriodWindow,
    catalog: &TariffCatalog,
    status: LineStatus,
) -> EngineResult<DriverWeekCalculation> {
    let driver_id = &facts.assignment.driver_id;
    let proration = prorate_window(&facts.assignment, window.start, window.end)?;

    // Modality: fall back to the lower-cost one and flag for review.
    let (modality, needs_review) = match facts.assignment.modality {
        Some(modality) => (modality, false),
        None => {
            let fallback = catalog.lower_cost_modality(window.start);
            warn!(
                driver_id = %driver_id,
                modality = ?fallback,
                "assignment has no modality; defaulting to lower-cost modality"
            );
            (fallback, true)
        }
    };

    // Tariff concepts: fall back to the documented constants and flag the
    // line as estimated.
    let (weekly_rent, quota, installments, estimated) =
        match catalog.modality_rates(modality, window.start) {
            Some(rates) => (
                rates.weekly_rent,
                rates.guarantee_quota,
                rates.guarantee_installments,
                false,
            ),
            None => {
                let fallback = catalog.fallback();
                warn!(
                    driver_id = %driver_id,
                    modality = ?modality,
                    "no tariff concept for modality; using fallback constants"
                );
                (
                    fallback.weekly_rent,
                    fallback.guarantee_quota,
                    fallback.guarantee_installments,
                    true,
                )
            }
        };

    let rent_amount = round_amount(weekly_rent * proration.factor);
    ensure_non_negative(driver_id, "rent", rent_amount)?;

    let guarantee = guarantee_installment(
        facts.guarantee.as_ref(),
        quota,
        installments,
        proration.factor,
    );
    ensure_non_negative(driver_id, "guarantee", guarantee.amount)?;

    let (km_excess_total, consumed_km) = sum_unapplied(&facts.km_excess);
    ensure_non_negative(driver_id, "km_excess", km_excess_total)?;

    let mut pass_through_total = Decimal::ZERO;
    let mut consumed_pass = Vec::new();
    for charge in facts.pass_through.iter().filter(|c| !c.applied) {
        ensure_non_negative(driver_id, "pass_through", charge.amount)?;
        pass_through_total += charge.amount;
        consumed_pass.push(charge.id);
    }

    let mut credits = Decimal::ZERO;
    let mut consumed_tickets = Vec::new();
    for credit in facts.ticket_credits.iter().filter(|c| c.is_eligible()) {
        ensure_non_negative(driver_id, "ticket_credit", credit.amount)?;
        credits += credit.amount;
        consumed_tickets.push(credit.id);
    }

    let mora = calculate_mora(facts.prior_balance, facts.mora_days, catalog.mora());

    let gross_charges = rent_amount + guarantee.amount + km_excess_total + pass_through_total;
    let net_charges = gross_charges - credits;
    let total_due = net_charges + facts.prior_balance + mora.amount;

    let line_id = Uuid::new_v4();
    let mut details = Vec::new();

    if rent_amount > Decimal::ZERO {
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: line_id,
            concept: ChargeConcept::Rent,
            description: format!(
                "Weekly rent, {} of {} days",
                proration.days_billed, DAYS_PER_WEEK
            ),
            quantity: proration.factor,
            unit_price: weekly_rent,
            subtotal: rent_amount,
            total: rent_amount,
            is_credit: false,
            source_ref: None,
        });
    }

    if guarantee.amount > Decimal::ZERO || guarantee.completed {
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: line_id,
            concept: ChargeConcept::Guarantee,
            description: guarantee.description.clone(),
            quantity: Decimal::ONE,
            unit_price: guarantee.amount,
            subtotal: guarantee.amount,
            total: guarantee.amount,
            is_credit: false,
            source_ref: None,
        });
    }

    for record in facts.km_excess.iter().filter(|r| !r.applied) {
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: line_id,
            concept: ChargeConcept::KmExcess,
            description: format!("Km excess {} km ({})", record.km_over, record.bracket),
            quantity: Decimal::ONE,
            unit_price: record.base_amount,
            subtotal: record.base_amount,
            total: record.total_amount,
            is_credit: false,
            source_ref: Some(SourceRef {
                id: record.id,
                kind: SourceKind::KmExcess,
            }),
        });
    }

    for charge in facts.pass_through.iter().filter(|c| !c.applied) {
        let concept = match charge.kind {
            PassThroughKind::Toll => ChargeConcept::Toll,
            PassThroughKind::Penalty => ChargeConcept::Penalty,
        };
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: line_id,
            concept,
            description: charge.description.clone(),
            quantity: Decimal::ONE,
            unit_price: charge.amount,
            subtotal: charge.amount,
            total: charge.amount,
            is_credit: false,
            source_ref: Some(SourceRef {
                id: charge.id,
                kind: SourceKind::PassThrough,
            }),
        });
    }

    for credit in facts.ticket_credits.iter().filter(|c| c.is_eligible()) {
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: line_id,
            concept: ChargeConcept::TicketCredit,
            description: "Approved ticket credit".to_string(),
            quantity: Decimal::ONE,
            unit_price: credit.amount,
            subtotal: credit.amount,
            total: credit.amount,
            is_credit: true,
            source_ref: Some(SourceRef {
                id: credit.id,
                kind: SourceKind::TicketCredit,
            }),
        });
    }

    if mora.amount > Decimal::ZERO {
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: line_id,
            concept: ChargeConcept::Mora,
            description: format!(
                "Late-payment interest, {} days on carried balance",
                mora.days_applied
            ),
            quantity: Decimal::from(mora.days_applied),
            unit_price: round_amount(facts.prior_balance * catalog.mora().flat_rate),
            subtotal: mora.amount,
            total: mora.amount,
            is_credit: false,
            source_ref: None,
        });
    }

    let line = BillingLine {
        id: line_id,
        period_id: window.period_id,
        driver_id: driver_id.clone(),
        modality,
        days_billed: proration.days_billed,
        prorated_factor: proration.factor,
        rent_amount,
        guarantee_amount: guarantee.amount,
        gross_charges,
        credits,
        net_charges,
        prior_balance: facts.prior_balance,
        mora_days: mora.days_applied,
        mora_amount: mora.amount,
        total_due,
        status,
        estimated,
        needs_review,
    };

    Ok(DriverWeekCalculation {
        line,
        details,
        guarantee_charged: guarantee.amount,
        guarantee_quota: quota,
        guarantee_installments: installments,
        consumed: ConsumedFacts {
            km_excess: consumed_km,
            ticket_credits: consumed_tickets,
            pass_through: consumed_pass,
        },
    })
}

fn ensure_non_negative(driver_id: &str, concept: &str, amount: Decimal) -> EngineResult<()> {
    if amount < Decimal::ZERO {
        return Err(EngineError::NegativeAmount {
            driver_id: driver_id.to_string(),
            concept: concept.to_string(),
            amount: amount.to_string(),
        });
    }
    Ok(())
}
