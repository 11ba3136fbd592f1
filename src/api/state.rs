//! Application state for the billing API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::{TariffCatalog, TariffLoader};
use crate::engine::BillingStore;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// loaded tariff catalog and the billing store.
#[derive(Clone)]
pub struct AppState {
    /// The loaded tariff catalog.
    catalog: Arc<TariffLoader>,
    /// The billing store backing all reads and writes.
    store: Arc<dyn BillingStore>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(catalog: TariffLoader, store: Arc<dyn BillingStore>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            store,
        }
    }

    /// Returns the tariff catalog.
    pub fn catalog(&self) -> &TariffCatalog {
        self.catalog.catalog()
    }

    /// Returns the billing store.
    pub fn store(&self) -> &dyn BillingStore {
        self.store.as_ref()
    }
}
