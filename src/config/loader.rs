//! Configuration loading functionality.
//!
//! This module provides the [`TariffLoader`] type for loading the tariff
//! catalog from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{CatalogFile, RateSheet, TariffCatalog, TierFile};

/// Loads and provides access to the tariff catalog.
///
/// The `TariffLoader` reads YAML configuration files from a directory and
/// hands out the aggregated [`TariffCatalog`].
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/fleet/
/// ├── catalog.yaml          # Operator metadata, mora, VAT, fallbacks
/// ├── km_excess_tiers.yaml  # Km-excess tier bands
/// └── rates/
///     └── 2025-01-06.yaml   # Modality rates effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use fleet_billing::config::TariffLoader;
///
/// let loader = TariffLoader::load("./config/fleet").unwrap();
/// println!("Catalog for: {}", loader.catalog().metadata().operator);
/// ```
#[derive(Debug, Clone)]
pub struct TariffLoader {
    catalog: TariffCatalog,
}

impl TariffLoader {
    /// Loads the catalog from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/fleet")
    ///
    /// # Returns
    ///
    /// Returns a `TariffLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - The tier table contains overlapping bands
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let catalog_path = path.join("catalog.yaml");
        let catalog_file = Self::load_yaml::<CatalogFile>(&catalog_path)?;

        let tiers_path = path.join("km_excess_tiers.yaml");
        let tier_file = Self::load_yaml::<TierFile>(&tiers_path)?;
        Self::validate_tiers(&tier_file, &tiers_path)?;

        let rates_dir = path.join("rates");
        let rate_sheets = Self::load_rate_sheets(&rates_dir)?;

        let catalog = TariffCatalog::new(catalog_file, rate_sheets, tier_file.tiers);

        Ok(Self { catalog })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Rejects tier tables with overlapping or unordered bands.
    fn validate_tiers(tier_file: &TierFile, path: &Path) -> EngineResult<()> {
        let mut sorted = tier_file.tiers.clone();
        sorted.sort_by_key(|t| t.min_km);

        for pair in sorted.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            let lower_max = match lower.max_km {
                Some(max) => max,
                None => {
                    return Err(EngineError::ConfigParseError {
                        path: path.display().to_string(),
                        message: format!(
                            "tier '{}' is open-ended but not the last band",
                            lower.label
                        ),
                    });
                }
            };
            if upper.min_km <= lower_max {
                return Err(EngineError::ConfigParseError {
                    path: path.display().to_string(),
                    message: format!(
                        "tiers '{}' and '{}' overlap",
                        lower.label, upper.label
                    ),
                });
            }
        }
        Ok(())
    }

    /// Loads all rate sheets from the rates directory.
    fn load_rate_sheets(rates_dir: &Path) -> EngineResult<Vec<RateSheet>> {
        let rates_dir_str = rates_dir.display().to_string();

        if !rates_dir.exists() {
            return Err(EngineError::ConfigNotFound {
                path: rates_dir_str,
            });
        }

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut sheets = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let sheet = Self::load_yaml::<RateSheet>(&path)?;
                sheets.push(sheet);
            }
        }

        if sheets.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate sheets found)", rates_dir_str),
            });
        }

        Ok(sheets)
    }

    /// Returns the loaded catalog.
    pub fn catalog(&self) -> &TariffCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Modality;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/fleet"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = TariffLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.catalog().metadata().currency, "COP");
    }

    #[test]
    fn test_modality_rates_for_fixed_fee() {
        let loader = TariffLoader::load(config_path()).unwrap();
        let on = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();

        let rates = loader
            .catalog()
            .modality_rates(Modality::FixedFee, on)
            .unwrap();
        assert_eq!(rates.weekly_rent, dec("520000"));
        assert_eq!(rates.guarantee_quota, dec("50000"));
        assert_eq!(rates.guarantee_installments, 20);
    }

    #[test]
    fn test_modality_rates_for_shift_based() {
        let loader = TariffLoader::load(config_path()).unwrap();
        let on = NaiveDate::from_ymd_opt(2025, 8, 4).unwrap();

        let rates = loader
            .catalog()
            .modality_rates(Modality::ShiftBased, on)
            .unwrap();
        assert_eq!(rates.weekly_rent, dec("430000"));
        assert_eq!(rates.guarantee_quota, dec("40000"));
    }

    #[test]
    fn test_mora_config_loaded() {
        let loader = TariffLoader::load(config_path()).unwrap();
        assert_eq!(loader.catalog().mora().flat_rate, dec("0.015"));
        assert_eq!(loader.catalog().mora().max_days, 7);
    }

    #[test]
    fn test_vat_rate_loaded() {
        let loader = TariffLoader::load(config_path()).unwrap();
        assert_eq!(loader.catalog().vat_rate(), dec("0.19"));
    }

    #[test]
    fn test_tier_table_loaded_in_order() {
        let loader = TariffLoader::load(config_path()).unwrap();
        let tiers = loader.catalog().tiers();
        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[0].label, "tier_a");
        assert!(tiers.last().unwrap().max_km.is_none());
    }

    #[test]
    fn test_fallback_rates_loaded() {
        let loader = TariffLoader::load(config_path()).unwrap();
        assert_eq!(loader.catalog().fallback().weekly_rent, dec("430000"));
        assert_eq!(loader.catalog().fallback().guarantee_quota, dec("40000"));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = TariffLoader::load("/nonexistent/path");
        assert!(result.is_err());

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("catalog.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }
}
