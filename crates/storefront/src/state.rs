//! Application state shared across handlers.

use std::sync::Arc;

use bloom_store::{ProductRepository, Store};

use crate::config::StorefrontConfig;
use crate::services::{DeliveryService, GeocodeError, Geocoder};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the document store, delivery pricing and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Store,
    delivery: DeliveryService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoder cannot be configured.
    pub fn new(config: StorefrontConfig, store: Store) -> Result<Self, GeocodeError> {
        let geocoder = Geocoder::new(&config.geocoder)?;
        let delivery = DeliveryService::new(geocoder, config.shop.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                delivery,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the delivery service.
    #[must_use]
    pub fn delivery(&self) -> &DeliveryService {
        &self.inner.delivery
    }

    /// Product repository over the shared store.
    #[must_use]
    pub fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.store)
    }
}
