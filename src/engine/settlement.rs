//! Termination settlement operations.
//!
//! Creating a settlement computes the driver's final charge breakdown at
//! the cutoff date and stores it as a draft; approving it is terminal:
//! the consumed source facts flip, the ledger takes the final movements,
//! the guarantee refund is credited and the driver's assignment is
//! deactivated. An approved settlement can never be approved again.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{PeriodWindow, calculate_settlement};
use crate::config::TariffCatalog;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BalanceMovement, BillingLineDetail, BillingWeek, ChargeConcept, GuaranteeAccount,
    MovementType, SettlementStatus, SourceKind, TerminationSettlement,
};

use super::generation::gather_facts;
use super::store::BillingStore;

/// Computes and stores a draft settlement for a driver leaving at the
/// given cutoff date.
///
/// The calculation is the regular driver-week calculator clipped at the
/// cutoff, plus the guarantee refund. Nothing is consumed or posted to
/// the ledger until the settlement is approved.
pub fn create_settlement(
    store: &dyn BillingStore,
    catalog: &TariffCatalog,
    driver_id: &str,
    cutoff_date: NaiveDate,
) -> EngineResult<TerminationSettlement> {
    let assignment = store
        .live_assignments()
        .into_iter()
        .find(|a| a.driver_id == driver_id && a.active)
        .ok_or_else(|| EngineError::DriverNotFound {
            driver_id: driver_id.to_string(),
        })?;

    let week = BillingWeek::containing(cutoff_date);
    let period_id = store
        .period_for_week(week)
        .map_or_else(Uuid::new_v4, |p| p.id);
    let window = PeriodWindow::clipped(period_id, week, cutoff_date)?;

    let facts = gather_facts(store, assignment);
    let result = calculate_settlement(&facts, &window, catalog)?;

    let mut details = result.calculation.details;
    if result.refund > Decimal::ZERO {
        details.push(BillingLineDetail {
            id: Uuid::new_v4(),
            billing_line_id: result.calculation.line.id,
            concept: ChargeConcept::GuaranteeRefund,
            description: "Guarantee deposit refund".to_string(),
            quantity: Decimal::ONE,
            unit_price: result.refund,
            subtotal: result.refund,
            total: result.refund,
            is_credit: true,
            source_ref: None,
        });
    }

    let settlement = TerminationSettlement {
        id: Uuid::new_v4(),
        driver_id: driver_id.to_string(),
        cutoff_date,
        line: result.calculation.line,
        details,
        guarantee_refund: result.refund,
        status: SettlementStatus::Draft,
        created_at: Utc::now(),
        approved_at: None,
        approved_by: None,
    };

    store.insert_settlement(settlement.clone());
    info!(
        driver_id = %driver_id,
        settlement_id = %settlement.id,
        cutoff = %cutoff_date,
        total_due = %settlement.line.total_due,
        refund = %settlement.guarantee_refund,
        "settlement draft created"
    );

    Ok(settlement)
}

/// Approves a draft settlement. Terminal and irreversible.
///
/// Flips the consumed source facts (re-checking each at flip time),
/// advances the guarantee account by the final installment, posts the
/// settlement charge and the refund credit to the ledger, and deactivates
/// the driver's assignment.
pub fn approve_settlement(
    store: &dyn BillingStore,
    catalog: &TariffCatalog,
    settlement_id: Uuid,
    actor: &str,
) -> EngineResult<TerminationSettlement> {
    let mut settlement =
        store
            .settlement(settlement_id)
            .ok_or_else(|| EngineError::SettlementNotFound {
                settlement_id: settlement_id.to_string(),
            })?;

    if settlement.status == SettlementStatus::Approved {
        return Err(EngineError::InvalidSettlement {
            driver_id: settlement.driver_id.clone(),
            message: "already approved; approval is terminal".to_string(),
        });
    }

    let driver_id = settlement.driver_id.clone();
    let week = BillingWeek::containing(settlement.cutoff_date);
    let period_id = settlement.line.period_id;

    for detail in &settlement.details {
        let Some(source_ref) = detail.source_ref else {
            continue;
        };
        let flipped = match source_ref.kind {
            SourceKind::KmExcess => store.mark_km_excess_applied(source_ref.id, period_id),
            SourceKind::TicketCredit => store.mark_ticket_applied(source_ref.id, period_id),
            SourceKind::PassThrough => store.mark_pass_through_applied(source_ref.id, period_id),
        };
        if !flipped {
            warn!(
                driver_id = %driver_id,
                record_id = %source_ref.id,
                "source fact already applied elsewhere; flip skipped"
            );
        }
    }

    if settlement.line.guarantee_amount > Decimal::ZERO {
        let mut account = store.guarantee_account(&driver_id).unwrap_or_else(|| {
            let installments = catalog
                .modality_rates(settlement.line.modality, settlement.cutoff_date)
                .map_or(catalog.fallback().guarantee_installments, |r| {
                    r.guarantee_installments
                });
            GuaranteeAccount::new(driver_id.clone(), settlement.line.modality, installments)
        });
        let quota = catalog
            .modality_rates(settlement.line.modality, settlement.cutoff_date)
            .map_or(catalog.fallback().guarantee_quota, |r| r.guarantee_quota);
        account.advance(settlement.line.guarantee_amount, quota);
        store.save_guarantee_account(account);
    }

    if settlement.line.mora_amount > Decimal::ZERO {
        store.accrue_mora(&driver_id, settlement.line.mora_amount);
    }

    let final_charge = settlement.line.net_charges + settlement.line.mora_amount;
    if final_charge != Decimal::ZERO {
        let movement_type = if final_charge > Decimal::ZERO {
            MovementType::Charge
        } else {
            MovementType::Credit
        };
        store.append_movement(
            BalanceMovement::new(
                &driver_id,
                movement_type,
                final_charge,
                "settlement",
                settlement.id.to_string(),
            )
            .for_week(week),
        );
    }

    if settlement.guarantee_refund > Decimal::ZERO {
        store.append_movement(
            BalanceMovement::new(
                &driver_id,
                MovementType::Credit,
                settlement.guarantee_refund,
                "guarantee_refund",
                settlement.id.to_string(),
            )
            .for_week(week),
        );
    }

    store.deactivate_driver(&driver_id);

    settlement.status = SettlementStatus::Approved;
    settlement.approved_at = Some(Utc::now());
    settlement.approved_by = Some(actor.to_string());
    store.update_settlement(settlement.clone());

    info!(
        driver_id = %driver_id,
        settlement_id = %settlement.id,
        actor = %actor,
        net_settlement = %settlement.net_settlement(),
        "settlement approved; driver deactivated"
    );

    Ok(settlement)
}
