//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::CartRemote;
use crate::config::StorefrontConfig;
use crate::shopify::{ShopifyError, StorefrontClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// Shopify client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    carts: Arc<dyn CartRemote>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Cart mutations go to the same Storefront client as catalog reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the Storefront HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ShopifyError> {
        let storefront = StorefrontClient::new(&config.shopify)?;
        let carts: Arc<dyn CartRemote> = Arc::new(storefront.clone());
        Ok(Self::with_cart_remote(config, storefront, carts))
    }

    /// Create state with a custom cart remote.
    #[must_use]
    pub fn with_cart_remote(
        config: StorefrontConfig,
        storefront: StorefrontClient,
        carts: Arc<dyn CartRemote>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get the remote that applies cart mutations.
    #[must_use]
    pub fn carts(&self) -> &dyn CartRemote {
        self.inner.carts.as_ref()
    }
}
