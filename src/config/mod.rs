//! Tariff catalog loading and management.
//!
//! This module provides functionality to load the operator's tariff catalog
//! from YAML files: modality rates, guarantee quotas, km-excess tier bands,
//! mora and VAT rates.
//!
//! # Example
//!
//! ```no_run
//! use fleet_billing::config::TariffLoader;
//!
//! let loader = TariffLoader::load("./config/fleet").unwrap();
//! println!("Loaded catalog: {}", loader.catalog().metadata().version);
//! ```

mod loader;
mod types;

pub use loader::TariffLoader;
pub use types::{
    CatalogFile, CatalogMetadata, FallbackRates, KmExcessTier, ModalityRates, MoraConfig,
    RateSheet, SourceStrategy, TariffCatalog, TierFile,
};
