//! Weekly generation runs: the ledger updater.
//!
//! A generation run acquires the period lock, rolls back the previous
//! run's effects (idempotent regeneration is a full replace, never a
//! merge), computes every eligible driver through the shared calculator,
//! swaps the staged line set in atomically, then applies the per-driver
//! side effects: consumption flips, guarantee advances, balance movements
//! and period totals. A failure on one driver never corrupts the others;
//! the run reports the skips and the period still lands in `Open`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    DriverWeekCalculation, DriverWeekFacts, PeriodWindow, calculate_driver_week,
};
use crate::config::TariffCatalog;
use crate::error::EngineResult;
use crate::models::{
    BalanceMovement, BillingLine, BillingLineDetail, BillingPeriod, BillingWeek,
    DriverWeekAssignment, GuaranteeAccount, LineStatus, MovementType, PeriodStatus, PeriodTotals,
};

use super::source::source_for;
use super::store::BillingStore;

/// A driver excluded from a run, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDriver {
    /// The skipped driver.
    pub driver_id: String,
    /// Why the driver's line was not committed.
    pub reason: String,
}

/// The outcome of a generation run.
///
/// Never a hard failure once the period lock is held: per-driver problems
/// land in `drivers_skipped` and the period totals cover the committed
/// drivers only.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// The period after the run, status `Open`.
    pub period: BillingPeriod,
    /// How many drivers committed a billing line.
    pub drivers_processed: u32,
    /// Drivers excluded from the run, with reasons.
    pub drivers_skipped: Vec<SkippedDriver>,
}

/// One driver's projected line in a preview.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewedDriver {
    /// The projected billing line.
    pub line: BillingLine,
    /// The projected detail rows.
    pub details: Vec<BillingLineDetail>,
}

/// The projection a preview run returns.
///
/// Computed by the same calculator as a commit, against live facts,
/// without persisting anything or flagging any source fact as applied.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodPreview {
    /// The previewed week.
    pub week: BillingWeek,
    /// The current status of the week's period (`NotGenerated` when no
    /// period row exists yet).
    pub status: PeriodStatus,
    /// The projected per-driver lines.
    pub drivers: Vec<PreviewedDriver>,
    /// Drivers the projection had to skip, with reasons.
    pub skipped: Vec<SkippedDriver>,
    /// Projected period totals.
    pub totals: PeriodTotals,
}

/// Assembles the calculator's input snapshot for one driver.
pub(crate) fn gather_facts(
    store: &dyn BillingStore,
    assignment: DriverWeekAssignment,
) -> DriverWeekFacts {
    let driver_id = assignment.driver_id.clone();
    let balance = store.driver_balance(&driver_id);
    DriverWeekFacts {
        guarantee: store.guarantee_account(&driver_id),
        km_excess: store.unapplied_km_excess(&driver_id),
        ticket_credits: store.approved_ticket_credits(&driver_id),
        pass_through: store.unapplied_pass_through(&driver_id),
        prior_balance: balance.current_balance,
        mora_days: balance.mora_days,
        assignment,
    }
}

/// The new charges a line puts on the ledger this period: everything in
/// `total_due` except the balance the driver already carried.
fn period_charge(line: &BillingLine) -> Decimal {
    line.net_charges + line.mora_amount
}

/// Rolls back the previous run of this period before recomputing.
///
/// Reverses the balance movements, guarantee advances and mora accruals
/// of every existing line, and releases the source facts the period had
/// consumed, so the recomputation sees the same facts the first run saw.
fn rollback_prior_run(
    store: &dyn BillingStore,
    catalog: &TariffCatalog,
    period: &BillingPeriod,
    week: BillingWeek,
) {
    let prior = store.lines_for_period(period.id);
    if prior.is_empty() {
        return;
    }
    info!(
        period_id = %period.id,
        lines = prior.len(),
        "rolling back previous run for regeneration"
    );

    for (line, _) in &prior {
        let charge = period_charge(line);
        if charge != Decimal::ZERO {
            let movement_type = if charge > Decimal::ZERO {
                MovementType::Credit
            } else {
                MovementType::Charge
            };
            store.append_movement(
                BalanceMovement::new(
                    &line.driver_id,
                    movement_type,
                    charge,
                    "regeneration_reversal",
                    line.id.to_string(),
                )
                .for_week(week),
            );
        }

        if line.mora_amount > Decimal::ZERO {
            store.accrue_mora(&line.driver_id, -line.mora_amount);
        }

        if line.guarantee_amount > Decimal::ZERO {
            if let Some(mut account) = store.guarantee_account(&line.driver_id) {
                let quota = catalog
                    .modality_rates(line.modality, period.start_date)
                    .map_or(catalog.fallback().guarantee_quota, |r| r.guarantee_quota);
                account.revert(line.guarantee_amount, quota);
                store.save_guarantee_account(account);
            }
        }
    }

    store.release_consumptions_for_period(period.id);
}

/// Applies one committed calculation's side effects: flips, guarantee
/// advance, mora accrual and the balance movement.
fn commit_driver(
    store: &dyn BillingStore,
    week: BillingWeek,
    period_id: Uuid,
    calc: &DriverWeekCalculation,
) {
    let driver_id = &calc.line.driver_id;

    // Consumption flips re-check the applied flag at flip time; a record
    // grabbed by another line in the meantime is skipped without error.
    for record_id in &calc.consumed.km_excess {
        if !store.mark_km_excess_applied(*record_id, period_id) {
            warn!(
                driver_id = %driver_id,
                record_id = %record_id,
                "km-excess record already applied elsewhere; flip skipped"
            );
        }
    }
    for ticket_id in &calc.consumed.ticket_credits {
        if !store.mark_ticket_applied(*ticket_id, period_id) {
            warn!(
                driver_id = %driver_id,
                ticket_id = %ticket_id,
                "ticket credit no longer approved; flip skipped"
            );
        }
    }
    for charge_id in &calc.consumed.pass_through {
        if !store.mark_pass_through_applied(*charge_id, period_id) {
            warn!(
                driver_id = %driver_id,
                charge_id = %charge_id,
                "pass-through charge already applied elsewhere; flip skipped"
            );
        }
    }

    if calc.guarantee_charged > Decimal::ZERO {
        let mut account = store.guarantee_account(driver_id).unwrap_or_else(|| {
            GuaranteeAccount::new(
                driver_id.clone(),
                calc.line.modality,
                calc.guarantee_installments,
            )
        });
        account.advance(calc.guarantee_charged, calc.guarantee_quota);
        store.save_guarantee_account(account);
    }

    if calc.line.mora_amount > Decimal::ZERO {
        store.accrue_mora(driver_id, calc.line.mora_amount);
    }

    let charge = period_charge(&calc.line);
    if charge != Decimal::ZERO {
        let movement_type = if charge > Decimal::ZERO {
            MovementType::Charge
        } else {
            MovementType::Credit
        };
        store.append_movement(
            BalanceMovement::new(
                driver_id,
                movement_type,
                charge,
                "weekly_billing",
                calc.line.id.to_string(),
            )
            .for_week(week),
        );
    }
}

/// Generates (or regenerates) the billing period for a week.
///
/// The contract of the run, in order:
///
/// 1. Atomically test-and-set the period into `Processing` (the sole
///    concurrency gate).
/// 2. Roll back the previous run's effects and delete its lines.
/// 3. Run the shared calculator once per eligible driver; failures are
///    isolated, logged and reported.
/// 4. Swap in the staged line set atomically.
/// 5. Flip consumed source facts, advance guarantee accounts, append
///    balance movements.
/// 6. Accumulate the period totals and land the period in `Open`.
pub fn generate_period(
    store: &dyn BillingStore,
    catalog: &TariffCatalog,
    week: BillingWeek,
) -> EngineResult<GenerationReport> {
    let period = store.lock_period_for_generation(week)?;
    info!(week = %week, period_id = %period.id, "generation run started");

    rollback_prior_run(store, catalog, &period, week);

    let source = source_for(catalog.driver_source());
    let assignments = source.billable_drivers(store, week);
    let window = PeriodWindow::full_week(period.id, week);

    let mut staged: Vec<DriverWeekCalculation> = Vec::new();
    let mut skipped: Vec<SkippedDriver> = Vec::new();

    for assignment in assignments {
        let facts = gather_facts(store, assignment);
        match calculate_driver_week(&facts, &window, catalog, LineStatus::Committed) {
            Ok(calc) => staged.push(calc),
            Err(error) => {
                warn!(
                    driver_id = %facts.assignment.driver_id,
                    error = %error,
                    "driver excluded from generation run"
                );
                skipped.push(SkippedDriver {
                    driver_id: facts.assignment.driver_id.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    // Staged swap: the period's whole line set replaces in one step, so a
    // failure before this point leaves the previous lines untouched and a
    // failure after it leaves a complete new set.
    let lines: Vec<(BillingLine, Vec<BillingLineDetail>)> = staged
        .iter()
        .map(|calc| (calc.line.clone(), calc.details.clone()))
        .collect();
    store.replace_period_lines(period.id, lines)?;

    let mut totals = PeriodTotals::default();
    for calc in &staged {
        commit_driver(store, week, period.id, calc);
        totals.driver_count += 1;
        totals.charges += calc.line.gross_charges + calc.line.mora_amount;
        totals.credits += calc.line.credits;
    }
    totals.net = totals.charges - totals.credits;

    let period = store.finish_generation(week, totals)?;
    info!(
        week = %week,
        drivers_processed = staged.len(),
        drivers_skipped = skipped.len(),
        net = %period.totals.net,
        "generation run finished"
    );

    Ok(GenerationReport {
        period,
        drivers_processed: staged.len() as u32,
        drivers_skipped: skipped,
    })
}

/// Projects the billing period for a week without persisting anything.
///
/// Runs the identical calculator against live facts; no period lock is
/// taken, no line is stored and no `applied` flag moves.
pub fn preview_period(
    store: &dyn BillingStore,
    catalog: &TariffCatalog,
    week: BillingWeek,
) -> EngineResult<PeriodPreview> {
    let existing = store.period_for_week(week);
    let period_id = existing.as_ref().map_or_else(Uuid::new_v4, |p| p.id);
    let status = existing.map_or(PeriodStatus::NotGenerated, |p| p.status);

    let source = source_for(catalog.driver_source());
    let assignments = source.billable_drivers(store, week);
    let window = PeriodWindow::full_week(period_id, week);

    let mut drivers: Vec<PreviewedDriver> = Vec::new();
    let mut skipped: Vec<SkippedDriver> = Vec::new();
    let mut totals = PeriodTotals::default();

    for assignment in assignments {
        let facts = gather_facts(store, assignment);
        match calculate_driver_week(&facts, &window, catalog, LineStatus::Preview) {
            Ok(calc) => {
                totals.driver_count += 1;
                totals.charges += calc.line.gross_charges + calc.line.mora_amount;
                totals.credits += calc.line.credits;
                drivers.push(PreviewedDriver {
                    line: calc.line,
                    details: calc.details,
                });
            }
            Err(error) => skipped.push(SkippedDriver {
                driver_id: facts.assignment.driver_id.clone(),
                reason: error.to_string(),
            }),
        }
    }
    totals.net = totals.charges - totals.credits;

    Ok(PeriodPreview {
        week,
        status,
        drivers,
        skipped,
        totals,
    })
}

/// Closes the week's period, stamping the actor.
pub fn close_period(
    store: &dyn BillingStore,
    week: BillingWeek,
    actor: &str,
) -> EngineResult<BillingPeriod> {
    let period = store.close_period(week, actor)?;
    info!(week = %week, actor = %actor, "billing period closed");
    Ok(period)
}

/// Reopens a closed period for regeneration or correction.
pub fn reopen_period(store: &dyn BillingStore, week: BillingWeek) -> EngineResult<BillingPeriod> {
    let period = store.reopen_period(week)?;
    info!(week = %week, "billing period reopened");
    Ok(period)
}
