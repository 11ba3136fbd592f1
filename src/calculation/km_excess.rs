//! Km-excess tiered pricing.
//!
//! Pricing happens once, at odometer intake: the tier, percentage and
//! amounts are frozen on the record. The weekly billing run only sums the
//! driver's unapplied records; it never re-prices them.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::TariffCatalog;
use crate::error::{EngineError, EngineResult};
use crate::models::KmExcessRecord;

use super::round_amount;

/// The priced components of one km-excess record.
#[derive(Debug, Clone, PartialEq)]
pub struct KmExcessPricing {
    /// The tier label the excess fell into.
    pub bracket: String,
    /// The percentage-of-rent rate fixed by the tier.
    pub percentage: Decimal,
    /// `round(weekly_rent × percentage)`.
    pub base_amount: Decimal,
    /// `round(base_amount × vat_rate)`.
    pub tax_amount: Decimal,
    /// `base_amount + tax_amount`.
    pub total_amount: Decimal,
}

/// Prices a kilometer excess against the configured tier table.
///
/// Returns `None` when `km_over` is zero (no excess, no charge).
///
/// # Errors
///
/// Returns [`EngineError::CalculationError`] when the excess falls into a
/// gap of the tier table; the loader validates bands are ordered and
/// non-overlapping but contiguity is the catalog author's responsibility.
///
/// # Examples
///
/// ```no_run
/// use fleet_billing::calculation::price_km_excess;
/// use fleet_billing::config::TariffLoader;
/// use rust_decimal::Decimal;
///
/// let loader = TariffLoader::load("./config/fleet").unwrap();
/// let pricing = price_km_excess(85, Decimal::from(520000), loader.catalog())
///     .unwrap()
///     .unwrap();
/// assert_eq!(pricing.bracket, "tier_b");
/// ```
pub fn price_km_excess(
    km_over: u32,
    weekly_rent: Decimal,
    catalog: &TariffCatalog,
) -> EngineResult<Option<KmExcessPricing>> {
    if km_over == 0 {
        return Ok(None);
    }

    let tier = catalog
        .tier_for(km_over)
        .ok_or_else(|| EngineError::CalculationError {
            message: format!("no km-excess tier covers an excess of {} km", km_over),
        })?;

    let base_amount = round_amount(weekly_rent * tier.percentage);
    let tax_amount = round_amount(base_amount * catalog.vat_rate());

    Ok(Some(KmExcessPricing {
        bracket: tier.label.clone(),
        percentage: tier.percentage,
        base_amount,
        tax_amount,
        total_amount: base_amount + tax_amount,
    }))
}

/// Builds a complete km-excess record for the odometer intake.
///
/// Returns `None` when the excess prices to nothing.
pub fn build_km_excess_record(
    driver_id: &str,
    km_over: u32,
    weekly_rent: Decimal,
    catalog: &TariffCatalog,
) -> EngineResult<Option<KmExcessRecord>> {
    let pricing = match price_km_excess(km_over, weekly_rent, catalog)? {
        Some(pricing) => pricing,
        None => return Ok(None),
    };

    Ok(Some(KmExcessRecord {
        id: Uuid::new_v4(),
        driver_id: driver_id.to_string(),
        period_id: None,
        km_over,
        bracket: pricing.bracket,
        percentage: pricing.percentage,
        base_amount: pricing.base_amount,
        tax_amount: pricing.tax_amount,
        total_amount: pricing.total_amount,
        applied: false,
    }))
}

/// Sums a driver's unapplied km-excess records for the weekly charge.
///
/// Each record's own tier and amounts were fixed at creation; the weekly
/// run only aggregates. Already-applied records are skipped (someone else
/// billed them).
///
/// Returns the total and the ids of the records the total consumed.
pub fn sum_unapplied(records: &[KmExcessRecord]) -> (Decimal, Vec<Uuid>) {
    let mut total = Decimal::ZERO;
    let mut consumed = Vec::new();
    for record in records.iter().filter(|r| !r.applied) {
        total += record.total_amount;
        consumed.push(record.id);
    }
    (total, consumed)
}
