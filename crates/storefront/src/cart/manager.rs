//! Cart state manager.
//!
//! Owns the current cart, mirrors it into a durable [`CartStore`] and
//! publishes every change through a `watch` channel. All remote mutations go
//! through a [`CartRemote`] and replace the local snapshot wholesale.
//!
//! # Recovery
//!
//! | operation | on expired cart |
//! |---|---|
//! | `add` | create a new cart, retry once against it |
//! | `update_quantity` / `remove_item` | clear local state, no retry |
//!
//! Mutations are serialized: a call waits for the previous one to finish,
//! so every request targets the freshest cart id.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};
use verger_core::{Cart, CartId, CartLineId, MerchandiseId, Money};

use super::protocol::{CartRemote, SyncError};
use super::store::{CartStore, StoreError};

/// Errors surfaced by [`CartManager`] operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CartError {
    /// The protocol failure, if this came from the remote.
    #[must_use]
    pub const fn as_sync(&self) -> Option<&SyncError> {
        match self {
            Self::Sync(err) => Some(err),
            Self::Store(_) | Self::Encode(_) => None,
        }
    }
}

/// Observable snapshot of the manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub cart: Option<Cart>,
    /// Sum of line quantities, 0 without a cart.
    pub item_count: u32,
    /// A mutation is running or queued.
    pub is_loading: bool,
    pub is_drawer_open: bool,
}

/// Result of `update_quantity` and `remove_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The remote applied the change; this is the new snapshot.
    Updated(Cart),
    /// There was no cart to change.
    Skipped,
    /// The cart had expired and local state was cleared.
    Reset,
}

/// Owner of the current cart.
pub struct CartManager {
    remote: Arc<dyn CartRemote>,
    store: Arc<dyn CartStore>,
    state: watch::Sender<CartState>,
    gate: Mutex<()>,
    in_flight: AtomicUsize,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Marks the manager busy for as long as it lives.
struct LoadingGuard<'a> {
    manager: &'a CartManager,
}

impl<'a> LoadingGuard<'a> {
    fn new(manager: &'a CartManager) -> Self {
        manager.in_flight.fetch_add(1, Ordering::SeqCst);
        manager.state.send_if_modified(|state| {
            let changed = !state.is_loading;
            state.is_loading = true;
            changed
        });
        Self { manager }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let remaining = self
            .manager
            .in_flight
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        if remaining == 0 {
            self.manager.state.send_if_modified(|state| {
                let changed = state.is_loading;
                state.is_loading = false;
                changed
            });
        }
    }
}

impl CartManager {
    /// Create a manager with no cart. Call [`CartManager::initialize`] to
    /// restore a persisted one.
    #[must_use]
    pub fn new(remote: Arc<dyn CartRemote>, store: Arc<dyn CartStore>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            remote,
            store,
            state,
            gate: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Current cart.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.state.borrow().cart.clone()
    }

    /// Sum of line quantities, 0 without a cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.state.borrow().item_count
    }

    /// Cart total, `None` without a cart.
    #[must_use]
    pub fn total(&self) -> Option<Money> {
        self.state
            .borrow()
            .cart
            .as_ref()
            .map(|cart| cart.total().clone())
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Receiver that sees every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    // =========================================================================
    // Drawer
    // =========================================================================

    pub fn open_drawer(&self) {
        self.set_drawer(true);
    }

    pub fn close_drawer(&self) {
        self.set_drawer(false);
    }

    #[must_use]
    pub fn is_drawer_open(&self) -> bool {
        self.state.borrow().is_drawer_open
    }

    fn set_drawer(&self, open: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_drawer_open != open;
            state.is_drawer_open = open;
            changed
        });
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Restore the persisted cart.
    ///
    /// Unreadable content is dropped and the slot purged; it never surfaces
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Option<Cart>, CartError> {
        let _turn = self.gate.lock().await;

        let Some(raw) = self.store.load().await? else {
            debug!("No persisted cart");
            return Ok(None);
        };

        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) if !cart.id.is_empty() => {
                info!(cart_id = %cart.id, items = cart.item_count(), "Restored persisted cart");
                self.publish(Some(cart.clone()));
                Ok(Some(cart))
            }
            parsed => {
                let reason = parsed.err().map_or_else(
                    || "blank cart id".to_string(),
                    |e| e.to_string(),
                );
                warn!(error = %reason, "Discarding malformed persisted cart");
                self.store.clear().await?;
                self.publish(None);
                Ok(None)
            }
        }
    }

    /// Create a new, empty cart and make it current.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote or the store fails; local state is
    /// unchanged in that case.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Cart, CartError> {
        let _busy = LoadingGuard::new(self);
        let _turn = self.gate.lock().await;

        let cart = self.remote.create_cart().await?;
        self.commit(&cart).await?;
        info!(cart_id = %cart.id, "Created cart");
        Ok(cart)
    }

    /// Add `quantity` (default 1) of a variant, creating a cart if needed.
    ///
    /// An expired cart is replaced by a new one and the add retried once.
    /// The replacement only becomes current if the retry succeeds.
    ///
    /// # Errors
    ///
    /// - `SyncError::Validation` for a blank merchandise id (nothing is sent)
    /// - any remote or store failure, including a failed retry
    #[instrument(skip(self), fields(merchandise_id = %merchandise_id))]
    pub async fn add(
        &self,
        merchandise_id: &MerchandiseId,
        quantity: Option<u32>,
    ) -> Result<Cart, CartError> {
        if merchandise_id.is_empty() {
            return Err(SyncError::Validation("merchandise id is required".to_string()).into());
        }
        let quantity = quantity.unwrap_or(1).max(1);

        let _busy = LoadingGuard::new(self);
        let _turn = self.gate.lock().await;

        let cart_id = match self.current_cart_id() {
            Some(id) => id,
            None => {
                let cart = self.remote.create_cart().await?;
                self.commit(&cart).await?;
                debug!(cart_id = %cart.id, "Created cart for first add");
                cart.id
            }
        };

        let cart = match self
            .remote
            .add_line(&cart_id, merchandise_id, quantity)
            .await
        {
            Ok(cart) => cart,
            Err(err) if err.is_expired_cart() => {
                warn!(cart_id = %cart_id, error = %err, "Cart expired, recreating and retrying add");
                let fresh = self.remote.create_cart().await?;
                self.remote
                    .add_line(&fresh.id, merchandise_id, quantity)
                    .await?
            }
            Err(err) => return Err(err.into()),
        };

        self.commit(&cart).await?;
        Ok(cart)
    }

    /// Set a line's quantity, clamped to at least 1.
    ///
    /// # Errors
    ///
    /// Returns an error on non-expiry remote failures or store failures.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(
        &self,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<MutationOutcome, CartError> {
        let quantity = quantity.max(1);
        let _busy = LoadingGuard::new(self);
        let _turn = self.gate.lock().await;

        let Some(cart_id) = self.current_cart_id() else {
            return Ok(MutationOutcome::Skipped);
        };

        let result = self.remote.update_line(&cart_id, line_id, quantity).await;
        self.settle(&cart_id, result).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error on non-expiry remote failures or store failures.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &CartLineId) -> Result<MutationOutcome, CartError> {
        let _busy = LoadingGuard::new(self);
        let _turn = self.gate.lock().await;

        let Some(cart_id) = self.current_cart_id() else {
            return Ok(MutationOutcome::Skipped);
        };

        let result = self.remote.remove_line(&cart_id, line_id).await;
        self.settle(&cart_id, result).await
    }

    /// Hand the checkout URL to `navigate` after clearing local state.
    ///
    /// Returns `false` (and never calls `navigate`) without a cart or
    /// checkout URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared; `navigate` is not
    /// called then.
    #[instrument(skip(self, navigate))]
    pub async fn go_to_checkout<F>(&self, navigate: F) -> Result<bool, CartError>
    where
        F: FnOnce(&str),
    {
        let _turn = self.gate.lock().await;

        let Some(cart) = self.cart().filter(Cart::has_checkout_url) else {
            debug!("No cart to check out");
            return Ok(false);
        };

        // Shopify never reports a completed checkout, so the cart is dropped here
        self.reset().await?;
        info!(cart_id = %cart.id, "Handing off to checkout");
        navigate(&cart.checkout_url);
        Ok(true)
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    fn current_cart_id(&self) -> Option<CartId> {
        self.state.borrow().cart.as_ref().map(|cart| cart.id.clone())
    }

    /// Apply the result of an update or remove.
    async fn settle(
        &self,
        cart_id: &CartId,
        result: Result<Cart, SyncError>,
    ) -> Result<MutationOutcome, CartError> {
        match result {
            Ok(cart) => {
                self.commit(&cart).await?;
                Ok(MutationOutcome::Updated(cart))
            }
            Err(err) if err.is_expired_cart() => {
                warn!(cart_id = %cart_id, error = %err, "Cart expired, clearing local cart");
                self.reset().await?;
                Ok(MutationOutcome::Reset)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist then publish a new snapshot.
    async fn commit(&self, cart: &Cart) -> Result<(), CartError> {
        let encoded = serde_json::to_string(cart)?;
        self.store.save(&encoded).await?;
        self.publish(Some(cart.clone()));
        Ok(())
    }

    /// Empty the slot then drop the in-memory cart.
    async fn reset(&self) -> Result<(), CartError> {
        self.store.clear().await?;
        self.publish(None);
        Ok(())
    }

    fn publish(&self, cart: Option<Cart>) {
        let item_count = cart.as_ref().map_or(0, Cart::item_count);
        self.state.send_modify(|state| {
            state.cart = cart;
            state.item_count = item_count;
        });
    }
}
