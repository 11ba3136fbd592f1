//! The collaborator storage boundary.
//!
//! The engine is a library-style core: its external interface is the data
//! contract with the surrounding application, expressed here as the
//! [`BillingStore`] trait. [`MemoryStore`] is the in-process
//! implementation used by the API layer and the test suite; a database
//! implementation would satisfy the same trait.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BalanceMovement, BillingLine, BillingLineDetail, BillingPeriod, BillingWeek,
    DriverBalance, DriverWeekAssignment, GuaranteeAccount, KmExcessRecord, PassThroughCharge,
    PeriodStatus, PeriodTotals, TerminationSettlement, TicketCredit, TicketStatus,
};

/// The data contract between the engine and its collaborators.
///
/// Reads cover the roster, tariff-relevant account state and source facts;
/// writes cover the period lifecycle, the full-replace line persistence,
/// consumption flips, guarantee advances, the balance ledger and
/// settlements. The period-status test-and-set in
/// [`BillingStore::lock_period_for_generation`] is the engine's sole
/// concurrency gate.
pub trait BillingStore: Send + Sync {
    /// Returns the period row for a week, if one exists yet.
    fn period_for_week(&self, week: BillingWeek) -> Option<BillingPeriod>;

    /// Atomically moves the week's period into `Processing`.
    ///
    /// Creates the period lazily on first generation. A period already
    /// `Processing` rejects the second run; a `Closed` period demands an
    /// explicit reopen first.
    fn lock_period_for_generation(&self, week: BillingWeek) -> EngineResult<BillingPeriod>;

    /// Completes a generation run: `Processing → Open` with totals.
    fn finish_generation(
        &self,
        week: BillingWeek,
        totals: PeriodTotals,
    ) -> EngineResult<BillingPeriod>;

    /// Closes an open period, stamping the actor.
    fn close_period(&self, week: BillingWeek, actor: &str) -> EngineResult<BillingPeriod>;

    /// Reopens a closed period.
    fn reopen_period(&self, week: BillingWeek) -> EngineResult<BillingPeriod>;

    /// Returns all live assignments, active and inactive.
    fn live_assignments(&self) -> Vec<DriverWeekAssignment>;

    /// Returns the weekly roster-control entries for a week.
    fn weekly_roster(&self, week: BillingWeek) -> Vec<DriverWeekAssignment>;

    /// Returns a driver's guarantee account, if one exists yet.
    fn guarantee_account(&self, driver_id: &str) -> Option<GuaranteeAccount>;

    /// Persists a guarantee account (created or advanced).
    fn save_guarantee_account(&self, account: GuaranteeAccount);

    /// Returns a driver's unapplied km-excess records.
    fn unapplied_km_excess(&self, driver_id: &str) -> Vec<KmExcessRecord>;

    /// Returns a driver's approved, not-yet-applied ticket credits.
    fn approved_ticket_credits(&self, driver_id: &str) -> Vec<TicketCredit>;

    /// Returns a driver's unapplied toll/penalty pass-throughs.
    fn unapplied_pass_through(&self, driver_id: &str) -> Vec<PassThroughCharge>;

    /// Returns a driver's balance, zeroed if the driver has no ledger yet.
    fn driver_balance(&self, driver_id: &str) -> DriverBalance;

    /// Returns the committed lines (with details) for a period.
    fn lines_for_period(&self, period_id: Uuid) -> Vec<(BillingLine, Vec<BillingLineDetail>)>;

    /// Replaces the whole line set for a period in one atomic step.
    ///
    /// Rejects `Closed` periods: a closed period's lines are immutable
    /// until it is explicitly reopened.
    fn replace_period_lines(
        &self,
        period_id: Uuid,
        lines: Vec<(BillingLine, Vec<BillingLineDetail>)>,
    ) -> EngineResult<()>;

    /// Releases every consumption made by a period: applied flags reset,
    /// consuming-period stamps cleared, applied tickets back to approved.
    ///
    /// Part of the delete step of an idempotent regeneration.
    fn release_consumptions_for_period(&self, period_id: Uuid);

    /// Flips a km-excess record to applied, re-checking at flip time.
    ///
    /// Returns `false` when the record was already applied (someone else
    /// billed it); the caller skips it without error.
    fn mark_km_excess_applied(&self, record_id: Uuid, period_id: Uuid) -> bool;

    /// Flips an approved ticket credit to applied. Returns `false` when
    /// the credit is no longer approved.
    fn mark_ticket_applied(&self, ticket_id: Uuid, period_id: Uuid) -> bool;

    /// Flips a pass-through charge to applied. Returns `false` when the
    /// charge was already applied.
    fn mark_pass_through_applied(&self, charge_id: Uuid, period_id: Uuid) -> bool;

    /// Appends a balance movement and updates the ledger head.
    fn append_movement(&self, movement: BalanceMovement) -> DriverBalance;

    /// Adds (or, with a negative amount, removes) lifetime mora on a
    /// driver's ledger head.
    fn accrue_mora(&self, driver_id: &str, amount: Decimal);

    /// Returns a driver's full movement history, oldest first.
    fn movements_for_driver(&self, driver_id: &str) -> Vec<BalanceMovement>;

    /// Inserts a draft settlement.
    fn insert_settlement(&self, settlement: TerminationSettlement);

    /// Returns a settlement by id.
    fn settlement(&self, settlement_id: Uuid) -> Option<TerminationSettlement>;

    /// Persists an updated settlement.
    fn update_settlement(&self, settlement: TerminationSettlement);

    /// Deactivates a driver's assignment after settlement approval.
    fn deactivate_driver(&self, driver_id: &str);
}

#[derive(Debug, Default)]
struct Inner {
    periods: HashMap<BillingWeek, BillingPeriod>,
    lines: HashMap<Uuid, Vec<(BillingLine, Vec<BillingLineDetail>)>>,
    assignments: Vec<DriverWeekAssignment>,
    roster: HashMap<BillingWeek, Vec<DriverWeekAssignment>>,
    guarantees: HashMap<String, GuaranteeAccount>,
    km_excess: Vec<KmExcessRecord>,
    tickets: Vec<TicketCredit>,
    pass_through: Vec<PassThroughCharge>,
    balances: HashMap<String, DriverBalance>,
    movements: Vec<BalanceMovement>,
    settlements: HashMap<Uuid, TerminationSettlement>,
}

/// In-memory [`BillingStore`] implementation.
///
/// Backs the API layer and the test suite. A single `RwLock` makes every
/// trait method atomic, which is exactly the "logical transaction" the
/// generation contract asks for.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live assignment.
    pub fn seed_assignment(&self, assignment: DriverWeekAssignment) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.assignments.push(assignment);
    }

    /// Registers a weekly roster-control entry.
    pub fn seed_roster_entry(&self, week: BillingWeek, assignment: DriverWeekAssignment) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.roster.entry(week).or_default().push(assignment);
    }

    /// Stores a km-excess record produced by the odometer intake.
    pub fn seed_km_excess(&self, record: KmExcessRecord) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.km_excess.push(record);
    }

    /// Updates an unapplied km-excess record.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::KmExcessApplied`] when the stored record has
    /// already been consumed by a billing line.
    pub fn update_km_excess(&self, record: KmExcessRecord) -> EngineResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let existing = inner
            .km_excess
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| EngineError::CalculationError {
                message: format!("km-excess record {} does not exist", record.id),
            })?;
        if existing.applied {
            return Err(EngineError::KmExcessApplied {
                record_id: existing.id.to_string(),
            });
        }
        *existing = record;
        Ok(())
    }

    /// Deletes an unapplied km-excess record.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::KmExcessApplied`] when the record has
    /// already been consumed.
    pub fn delete_km_excess(&self, record_id: Uuid) -> EngineResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some(record) = inner.km_excess.iter().find(|r| r.id == record_id) {
            if record.applied {
                return Err(EngineError::KmExcessApplied {
                    record_id: record_id.to_string(),
                });
            }
        }
        inner.km_excess.retain(|r| r.id != record_id);
        Ok(())
    }

    /// Stores a ticket credit.
    pub fn seed_ticket_credit(&self, credit: TicketCredit) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.tickets.push(credit);
    }

    /// Stores a toll/penalty pass-through charge.
    pub fn seed_pass_through(&self, charge: PassThroughCharge) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.pass_through.push(charge);
    }

    /// Seeds a driver's opening balance through a ledger movement, so the
    /// balance stays equal to the signed sum of its movements.
    pub fn seed_opening_balance(&self, driver_id: &str, amount: Decimal, mora_days: u8) {
        use crate::models::MovementType;
        let movement_type = if amount >= Decimal::ZERO {
            MovementType::Charge
        } else {
            MovementType::Credit
        };
        let movement = BalanceMovement::new(
            driver_id,
            movement_type,
            amount,
            "opening_balance",
            "seed",
        );
        self.append_movement(movement);
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some(balance) = inner.balances.get_mut(driver_id) {
            balance.mora_days = mora_days;
        }
    }

    /// Sets a driver's mora-day counter (the payments collaborator's job).
    pub fn set_mora_days(&self, driver_id: &str, days: u8) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .balances
            .entry(driver_id.to_string())
            .or_insert_with(|| DriverBalance::new(driver_id))
            .mora_days = days;
    }

    fn period_by_id(inner: &Inner, period_id: Uuid) -> Option<&BillingPeriod> {
        inner.periods.values().find(|p| p.id == period_id)
    }
}

impl BillingStore for MemoryStore {
    fn period_for_week(&self, week: BillingWeek) -> Option<BillingPeriod> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.periods.get(&week).cloned()
    }

    fn lock_period_for_generation(&self, week: BillingWeek) -> EngineResult<BillingPeriod> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let period = inner
            .periods
            .entry(week)
            .or_insert_with(|| BillingPeriod::new(week));
        period.begin_generation()?;
        Ok(period.clone())
    }

    fn finish_generation(
        &self,
        week: BillingWeek,
        totals: PeriodTotals,
    ) -> EngineResult<BillingPeriod> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let period = inner
            .periods
            .get_mut(&week)
            .ok_or(EngineError::PeriodNotFound {
                week: week.week,
                year: week.year,
            })?;
        period.finish_generation(totals)?;
        Ok(period.clone())
    }

    fn close_period(&self, week: BillingWeek, actor: &str) -> EngineResult<BillingPeriod> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let period = inner
            .periods
            .get_mut(&week)
            .ok_or(EngineError::PeriodNotFound {
                week: week.week,
                year: week.year,
            })?;
        period.close(actor, Utc::now())?;
        Ok(period.clone())
    }

    fn reopen_period(&self, week: BillingWeek) -> EngineResult<BillingPeriod> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let period = inner
            .periods
            .get_mut(&week)
            .ok_or(EngineError::PeriodNotFound {
                week: week.week,
                year: week.year,
            })?;
        period.reopen()?;
        Ok(period.clone())
    }

    fn live_assignments(&self) -> Vec<DriverWeekAssignment> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.assignments.clone()
    }

    fn weekly_roster(&self, week: BillingWeek) -> Vec<DriverWeekAssignment> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.roster.get(&week).cloned().unwrap_or_default()
    }

    fn guarantee_account(&self, driver_id: &str) -> Option<GuaranteeAccount> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.guarantees.get(driver_id).cloned()
    }

    fn save_guarantee_account(&self, account: GuaranteeAccount) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .guarantees
            .insert(account.driver_id.clone(), account);
    }

    fn unapplied_km_excess(&self, driver_id: &str) -> Vec<KmExcessRecord> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .km_excess
            .iter()
            .filter(|r| r.driver_id == driver_id && !r.applied)
            .cloned()
            .collect()
    }

    fn approved_ticket_credits(&self, driver_id: &str) -> Vec<TicketCredit> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .tickets
            .iter()
            .filter(|t| t.driver_id == driver_id && t.status == TicketStatus::Approved)
            .cloned()
            .collect()
    }

    fn unapplied_pass_through(&self, driver_id: &str) -> Vec<PassThroughCharge> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .pass_through
            .iter()
            .filter(|c| c.driver_id == driver_id && !c.applied)
            .cloned()
            .collect()
    }

    fn driver_balance(&self, driver_id: &str) -> DriverBalance {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .balances
            .get(driver_id)
            .cloned()
            .unwrap_or_else(|| DriverBalance::new(driver_id))
    }

    fn lines_for_period(&self, period_id: Uuid) -> Vec<(BillingLine, Vec<BillingLineDetail>)> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.lines.get(&period_id).cloned().unwrap_or_default()
    }

    fn replace_period_lines(
        &self,
        period_id: Uuid,
        lines: Vec<(BillingLine, Vec<BillingLineDetail>)>,
    ) -> EngineResult<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if let Some(period) = Self::period_by_id(&inner, period_id) {
            if period.status == PeriodStatus::Closed {
                return Err(EngineError::PeriodClosed {
                    week: period.week.week,
                    year: period.week.year,
                });
            }
        }
        inner.lines.insert(period_id, lines);
        Ok(())
    }

    fn release_consumptions_for_period(&self, period_id: Uuid) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        for record in inner
            .km_excess
            .iter_mut()
            .filter(|r| r.period_id == Some(period_id))
        {
            record.applied = false;
            record.period_id = None;
        }
        for ticket in inner
            .tickets
            .iter_mut()
            .filter(|t| t.applied_period_id == Some(period_id))
        {
            ticket.status = TicketStatus::Approved;
            ticket.applied_period_id = None;
        }
        for charge in inner
            .pass_through
            .iter_mut()
            .filter(|c| c.period_id == Some(period_id))
        {
            charge.applied = false;
            charge.period_id = None;
        }
    }

    fn mark_km_excess_applied(&self, record_id: Uuid, period_id: Uuid) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.km_excess.iter_mut().find(|r| r.id == record_id) {
            Some(record) if !record.applied => {
                record.applied = true;
                record.period_id = Some(period_id);
                true
            }
            _ => false,
        }
    }

    fn mark_ticket_applied(&self, ticket_id: Uuid, period_id: Uuid) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.tickets.iter_mut().find(|t| t.id == ticket_id) {
            Some(ticket) if ticket.status == TicketStatus::Approved => {
                ticket.status = TicketStatus::Applied;
                ticket.applied_period_id = Some(period_id);
                true
            }
            _ => false,
        }
    }

    fn mark_pass_through_applied(&self, charge_id: Uuid, period_id: Uuid) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.pass_through.iter_mut().find(|c| c.id == charge_id) {
            Some(charge) if !charge.applied => {
                charge.applied = true;
                charge.period_id = Some(period_id);
                true
            }
            _ => false,
        }
    }

    fn append_movement(&self, movement: BalanceMovement) -> DriverBalance {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let balance = inner
            .balances
            .entry(movement.driver_id.clone())
            .or_insert_with(|| DriverBalance::new(&movement.driver_id));
        balance.apply(&movement);
        let result = balance.clone();
        inner.movements.push(movement);
        result
    }

    fn accrue_mora(&self, driver_id: &str, amount: Decimal) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .balances
            .entry(driver_id.to_string())
            .or_insert_with(|| DriverBalance::new(driver_id))
            .accrued_mora += amount;
    }

    fn movements_for_driver(&self, driver_id: &str) -> Vec<BalanceMovement> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .movements
            .iter()
            .filter(|m| m.driver_id == driver_id)
            .cloned()
            .collect()
    }

    fn insert_settlement(&self, settlement: TerminationSettlement) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.settlements.insert(settlement.id, settlement);
    }

    fn settlement(&self, settlement_id: Uuid) -> Option<TerminationSettlement> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.settlements.get(&settlement_id).cloned()
    }

    fn update_settlement(&self, settlement: TerminationSettlement) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.settlements.insert(settlement.id, settlement);
    }

    fn deactivate_driver(&self, driver_id: &str) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        for assignment in inner
            .assignments
            .iter_mut()
            .filter(|a| a.driver_id == driver_id)
        {
            assignment.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Modality;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn week() -> BillingWeek {
        BillingWeek {
            week: 32,
            year: 2025,
        }
    }

    fn km_record(driver_id: &str) -> KmExcessRecord {
        KmExcessRecord {
            id: Uuid::new_v4(),
            driver_id: driver_id.to_string(),
            period_id: None,
            km_over: 40,
            bracket: "tier_a".to_string(),
            percentage: dec("0.05"),
            base_amount: dec("26000"),
            tax_amount: dec("4940"),
            total_amount: dec("30940"),
            applied: false,
        }
    }

    /// ST-001: the period lock is a test-and-set
    #[test]
    fn test_lock_period_is_test_and_set() {
        let store = MemoryStore::new();
        let period = store.lock_period_for_generation(week()).unwrap();
        assert_eq!(period.status, PeriodStatus::Processing);

        match store.lock_period_for_generation(week()) {
            Err(EngineError::PeriodLocked { .. }) => {}
            other => panic!("Expected PeriodLocked, got {:?}", other),
        }
    }

    /// ST-002: finishing a run reopens the lock for recalculation
    #[test]
    fn test_finish_generation_reopens_lock() {
        let store = MemoryStore::new();
        store.lock_period_for_generation(week()).unwrap();
        store
            .finish_generation(week(), PeriodTotals::default())
            .unwrap();
        assert!(store.lock_period_for_generation(week()).is_ok());
    }

    /// ST-003: closed periods reject line replacement
    #[test]
    fn test_closed_period_rejects_line_replacement() {
        let store = MemoryStore::new();
        let period = store.lock_period_for_generation(week()).unwrap();
        store
            .finish_generation(week(), PeriodTotals::default())
            .unwrap();
        store.close_period(week(), "ops").unwrap();

        match store.replace_period_lines(period.id, vec![]) {
            Err(EngineError::PeriodClosed { .. }) => {}
            other => panic!("Expected PeriodClosed, got {:?}", other),
        }

        store.reopen_period(week()).unwrap();
        assert!(store.replace_period_lines(period.id, vec![]).is_ok());
    }

    /// ST-004: km-excess flip is first-wins
    #[test]
    fn test_km_excess_flip_first_wins() {
        let store = MemoryStore::new();
        let record = km_record("drv_001");
        let id = record.id;
        store.seed_km_excess(record);

        let period_a = Uuid::new_v4();
        let period_b = Uuid::new_v4();
        assert!(store.mark_km_excess_applied(id, period_a));
        assert!(!store.mark_km_excess_applied(id, period_b));

        assert!(store.unapplied_km_excess("drv_001").is_empty());
    }

    /// ST-005: editing or deleting an applied km record is rejected
    #[test]
    fn test_applied_km_record_rejects_mutation() {
        let store = MemoryStore::new();
        let record = km_record("drv_001");
        let id = record.id;
        store.seed_km_excess(record.clone());
        store.mark_km_excess_applied(id, Uuid::new_v4());

        match store.update_km_excess(record) {
            Err(EngineError::KmExcessApplied { .. }) => {}
            other => panic!("Expected KmExcessApplied, got {:?}", other),
        }
        match store.delete_km_excess(id) {
            Err(EngineError::KmExcessApplied { .. }) => {}
            other => panic!("Expected KmExcessApplied, got {:?}", other),
        }
    }

    /// ST-006: unapplied km records can be deleted
    #[test]
    fn test_unapplied_km_record_deletable() {
        let store = MemoryStore::new();
        let record = km_record("drv_001");
        let id = record.id;
        store.seed_km_excess(record);
        assert!(store.delete_km_excess(id).is_ok());
        assert!(store.unapplied_km_excess("drv_001").is_empty());
    }

    /// ST-007: releasing a period's consumptions restores the facts
    #[test]
    fn test_release_consumptions_restores_facts() {
        let store = MemoryStore::new();
        let record = km_record("drv_001");
        let record_id = record.id;
        store.seed_km_excess(record);

        let ticket = TicketCredit {
            id: Uuid::new_v4(),
            driver_id: "drv_001".to_string(),
            amount: dec("35000"),
            status: TicketStatus::Approved,
            applied_period_id: None,
        };
        let ticket_id = ticket.id;
        store.seed_ticket_credit(ticket);

        let period_id = Uuid::new_v4();
        store.mark_km_excess_applied(record_id, period_id);
        store.mark_ticket_applied(ticket_id, period_id);
        assert!(store.unapplied_km_excess("drv_001").is_empty());
        assert!(store.approved_ticket_credits("drv_001").is_empty());

        store.release_consumptions_for_period(period_id);
        assert_eq!(store.unapplied_km_excess("drv_001").len(), 1);
        assert_eq!(store.approved_ticket_credits("drv_001").len(), 1);
    }

    /// ST-008: releasing one period leaves another period's flips alone
    #[test]
    fn test_release_scoped_to_period() {
        let store = MemoryStore::new();
        let record_a = km_record("drv_001");
        let record_b = km_record("drv_001");
        let (id_a, id_b) = (record_a.id, record_b.id);
        store.seed_km_excess(record_a);
        store.seed_km_excess(record_b);

        let period_a = Uuid::new_v4();
        let period_b = Uuid::new_v4();
        store.mark_km_excess_applied(id_a, period_a);
        store.mark_km_excess_applied(id_b, period_b);

        store.release_consumptions_for_period(period_a);
        let unapplied = store.unapplied_km_excess("drv_001");
        assert_eq!(unapplied.len(), 1);
        assert_eq!(unapplied[0].id, id_a);
    }

    /// ST-009: the ledger head tracks appended movements
    #[test]
    fn test_ledger_head_tracks_movements() {
        use crate::models::MovementType;
        let store = MemoryStore::new();
        store.append_movement(BalanceMovement::new(
            "drv_001",
            MovementType::Charge,
            dec("570000"),
            "weekly_billing",
            "line-1",
        ));
        let balance = store.append_movement(BalanceMovement::new(
            "drv_001",
            MovementType::Credit,
            dec("70000"),
            "manual_adjustment",
            "adj-1",
        ));

        assert_eq!(balance.current_balance, dec("500000"));
        let signed_sum: Decimal = store
            .movements_for_driver("drv_001")
            .iter()
            .map(|m| m.signed_amount())
            .sum();
        assert_eq!(balance.current_balance, signed_sum);
    }

    /// ST-010: deactivation flips every assignment for the driver
    #[test]
    fn test_deactivate_driver() {
        let store = MemoryStore::new();
        store.seed_assignment(DriverWeekAssignment {
            driver_id: "drv_001".to_string(),
            vehicle_plate: "XYZ123".to_string(),
            modality: Some(Modality::FixedFee),
            start_date: None,
            end_date: None,
            active: true,
        });
        store.deactivate_driver("drv_001");
        assert!(store.live_assignments().iter().all(|a| !a.active));
    }

    #[test]
    fn test_unknown_driver_balance_is_zeroed() {
        let store = MemoryStore::new();
        let balance = store.driver_balance("ghost");
        assert_eq!(balance.current_balance, Decimal::ZERO);
        assert_eq!(balance.mora_days, 0);
    }

    #[test]
    fn test_ticket_flip_requires_approved_status() {
        let store = MemoryStore::new();
        let ticket = TicketCredit {
            id: Uuid::new_v4(),
            driver_id: "drv_001".to_string(),
            amount: dec("35000"),
            status: TicketStatus::Pending,
            applied_period_id: None,
        };
        let id = ticket.id;
        store.seed_ticket_credit(ticket);
        assert!(!store.mark_ticket_applied(id, Uuid::new_v4()));
    }
}
