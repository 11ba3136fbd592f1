//! Configuration types for the tariff catalog.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML catalog files.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::Modality;

/// Metadata about the operator's catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogMetadata {
    /// The fleet operator's name.
    pub operator: String,
    /// The billing currency code (e.g., "COP").
    pub currency: String,
    /// The version or effective date of the catalog.
    pub version: String,
}

/// Mora (late-payment) accrual configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MoraConfig {
    /// The flat daily rate applied to a carried balance.
    pub flat_rate: Decimal,
    /// The maximum number of mora days billed in one cycle.
    pub max_days: u8,
}

/// Documented fallback constants used when a tariff concept is missing.
///
/// A line priced from these is flagged `estimated`.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackRates {
    /// Fallback weekly rent.
    pub weekly_rent: Decimal,
    /// Fallback guarantee quota per installment.
    pub guarantee_quota: Decimal,
    /// Fallback number of guarantee installments.
    pub guarantee_installments: u32,
}

/// Which driver-selection strategy a generation run reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Read live assignment windows from the roster subsystem.
    LiveAssignments,
    /// Read the separate weekly roster-control table.
    WeeklyRoster,
}

/// The priced concepts for one modality.
#[derive(Debug, Clone, Deserialize)]
pub struct ModalityRates {
    /// The full weekly rent.
    pub weekly_rent: Decimal,
    /// The guarantee quota charged per week.
    pub guarantee_quota: Decimal,
    /// How many installments complete the guarantee deposit.
    pub guarantee_installments: u32,
}

/// A rate sheet effective from a specific date.
#[derive(Debug, Clone, Deserialize)]
pub struct RateSheet {
    /// The date these rates take effect.
    pub effective_date: NaiveDate,
    /// Priced concepts keyed by modality.
    pub modalities: HashMap<Modality, ModalityRates>,
}

/// One band in the km-excess tier table.
///
/// Bands are ordered and non-overlapping; the boundaries and rates are
/// external configuration, never hardcoded in the calculator.
#[derive(Debug, Clone, Deserialize)]
pub struct KmExcessTier {
    /// The tier label stamped on records (e.g. "tier_b").
    pub label: String,
    /// The lowest km-over value in the band (inclusive).
    pub min_km: u32,
    /// The highest km-over value in the band (inclusive); open-ended when
    /// absent.
    pub max_km: Option<u32>,
    /// The percentage of weekly rent charged for this band.
    pub percentage: Decimal,
}

impl KmExcessTier {
    /// Returns true if the given excess falls inside this band.
    pub fn contains(&self, km_over: u32) -> bool {
        km_over >= self.min_km && self.max_km.is_none_or(|max| km_over <= max)
    }
}

/// Top-level structure of `catalog.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    /// Operator metadata.
    pub catalog: CatalogMetadata,
    /// Mora accrual configuration.
    pub mora: MoraConfig,
    /// VAT rate applied to km-excess base amounts.
    pub vat_rate: Decimal,
    /// Fallback constants for missing concepts.
    pub fallback: FallbackRates,
    /// The driver-selection strategy for generation runs.
    pub driver_source: SourceStrategy,
}

/// Structure of `km_excess_tiers.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TierFile {
    /// The ordered tier bands.
    pub tiers: Vec<KmExcessTier>,
}

/// The complete tariff catalog loaded from the YAML files.
///
/// Aggregates the operator metadata, mora and VAT rates, effective-dated
/// rate sheets and the km-excess tier table.
#[derive(Debug, Clone)]
pub struct TariffCatalog {
    /// Operator metadata.
    metadata: CatalogMetadata,
    /// Mora configuration.
    mora: MoraConfig,
    /// VAT rate for km-excess pricing.
    vat_rate: Decimal,
    /// Fallback constants.
    fallback: FallbackRates,
    /// The configured driver-selection strategy.
    driver_source: SourceStrategy,
    /// Rate sheets sorted by effective date ascending.
    rate_sheets: Vec<RateSheet>,
    /// Tier bands sorted by `min_km` ascending.
    tiers: Vec<KmExcessTier>,
}

impl TariffCatalog {
    /// Creates a new catalog from its component parts.
    pub fn new(
        catalog_file: CatalogFile,
        rate_sheets: Vec<RateSheet>,
        tiers: Vec<KmExcessTier>,
    ) -> Self {
        let mut sorted_sheets = rate_sheets;
        sorted_sheets.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        let mut sorted_tiers = tiers;
        sorted_tiers.sort_by_key(|t| t.min_km);
        Self {
            metadata: catalog_file.catalog,
            mora: catalog_file.mora,
            vat_rate: catalog_file.vat_rate,
            fallback: catalog_file.fallback,
            driver_source: catalog_file.driver_source,
            rate_sheets: sorted_sheets,
            tiers: sorted_tiers,
        }
    }

    /// Returns the operator metadata.
    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    /// Returns the mora configuration.
    pub fn mora(&self) -> &MoraConfig {
        &self.mora
    }

    /// Returns the VAT rate applied to km-excess base amounts.
    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    /// Returns the documented fallback constants.
    pub fn fallback(&self) -> &FallbackRates {
        &self.fallback
    }

    /// Returns the configured driver-selection strategy.
    pub fn driver_source(&self) -> SourceStrategy {
        self.driver_source
    }

    /// Returns all rate sheets, oldest first.
    pub fn rate_sheets(&self) -> &[RateSheet] {
        &self.rate_sheets
    }

    /// Returns the tier table, lowest band first.
    pub fn tiers(&self) -> &[KmExcessTier] {
        &self.tiers
    }

    /// Resolves the priced concepts for a modality on a given date.
    ///
    /// The most recent rate sheet effective on or before the date wins.
    /// Returns `None` when no sheet covers the date or the sheet lacks the
    /// modality; callers fall back to [`Self::fallback`] and flag the line
    /// `estimated`.
    pub fn modality_rates(&self, modality: Modality, on: NaiveDate) -> Option<&ModalityRates> {
        self.rate_sheets
            .iter()
            .rfind(|sheet| sheet.effective_date <= on)
            .and_then(|sheet| sheet.modalities.get(&modality))
    }

    /// Returns the modality with the cheaper weekly rent on the given date.
    ///
    /// Used as the documented default when an assignment carries no
    /// modality. Ties and missing rates resolve to `ShiftBased`.
    pub fn lower_cost_modality(&self, on: NaiveDate) -> Modality {
        let fixed = self.modality_rates(Modality::FixedFee, on);
        let shift = self.modality_rates(Modality::ShiftBased, on);
        match (fixed, shift) {
            (Some(f), Some(s)) if f.weekly_rent < s.weekly_rent => Modality::FixedFee,
            _ => Modality::ShiftBased,
        }
    }

    /// Selects the tier band containing the given km excess.
    pub fn tier_for(&self, km_over: u32) -> Option<&KmExcessTier> {
        self.tiers.iter().find(|t| t.contains(km_over))
    }
}
