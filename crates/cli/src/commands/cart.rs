//! Cart commands.
//!
//! Every command restores the cart from the cart file, applies one manager
//! operation and reports the resulting state.
//!
//! # Environment Variables
//!
//! - `VERGER_CART_ENDPOINT` - Storefront cart endpoint (default: `http://127.0.0.1:3000/api/cart`)
//! - `VERGER_CART_FILE` - Cart file (default: `shopify_cart.json`)
//! - `SHOPIFY_*` - Storefront API settings, only read with `--direct`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use verger_core::{Cart, CartLineId, MerchandiseId};
use verger_storefront::cart::{
    CartError, CartManager, CartRemote, FileCartStore, HttpCartRemote, MutationOutcome,
};
use verger_storefront::config::{
    ConfigError, DEFAULT_REQUEST_TIMEOUT_SECS, ShopifyStorefrontConfig,
};
use verger_storefront::shopify::{ShopifyError, StorefrontClient};

/// Default storefront cart endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/cart";

/// Default cart file, relative to the working directory.
pub const DEFAULT_CART_FILE: &str = "shopify_cart.json";

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Shopify client error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("No line {0} in the current cart")]
    LineNotFound(String),
}

/// Where cart mutations are sent.
#[derive(Debug, Clone)]
pub enum Connection {
    /// A running storefront's `POST /api/cart`.
    Endpoint(String),
    /// The Shopify Storefront API.
    Direct,
}

/// A cart command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    Show,
    Create,
    Add {
        variant_id: String,
        quantity: Option<u32>,
    },
    Update {
        line_id: String,
        quantity: u32,
    },
    /// Change a line's quantity by `delta`, clamped to at least 1.
    Step {
        line_id: String,
        delta: i64,
    },
    Remove {
        line_id: String,
    },
    Checkout,
}

fn remote_for(connection: &Connection) -> Result<Arc<dyn CartRemote>, CartCommandError> {
    match connection {
        Connection::Endpoint(endpoint) => {
            tracing::debug!(endpoint = %endpoint, "Using storefront cart endpoint");
            let remote = HttpCartRemote::new(
                endpoint.clone(),
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            )?;
            Ok(Arc::new(remote))
        }
        Connection::Direct => {
            let config = ShopifyStorefrontConfig::from_env()?;
            let client = StorefrontClient::new(&config)?;
            tracing::debug!(endpoint = client.endpoint(), "Using Shopify directly");
            Ok(Arc::new(client))
        }
    }
}

/// Run a cart command.
///
/// # Errors
///
/// Returns an error if configuration is missing, the cart file cannot be
/// read or written, or the remote rejects the operation.
pub async fn run(
    connection: &Connection,
    cart_file: &Path,
    command: CartCommand,
) -> Result<(), CartCommandError> {
    let remote = remote_for(connection)?;
    let store = Arc::new(FileCartStore::new(cart_file));
    let manager = CartManager::new(remote, store);
    manager.initialize().await?;

    execute(&manager, command).await
}

/// Apply `command` to an initialized manager.
pub async fn execute(manager: &CartManager, command: CartCommand) -> Result<(), CartCommandError> {
    match command {
        CartCommand::Show => report(manager.cart().as_ref()),
        CartCommand::Create => {
            let cart = manager.create().await?;
            report(Some(&cart));
        }
        CartCommand::Add {
            variant_id,
            quantity,
        } => {
            let cart = manager
                .add(&MerchandiseId::new(variant_id), quantity)
                .await?;
            report(Some(&cart));
        }
        CartCommand::Update { line_id, quantity } => {
            let outcome = manager
                .update_quantity(&CartLineId::new(line_id), quantity)
                .await?;
            report_outcome(&outcome);
        }
        CartCommand::Step { line_id, delta } => {
            let line_id = CartLineId::new(line_id);
            let current = manager
                .cart()
                .and_then(|cart| cart.line(&line_id).map(|line| line.quantity))
                .ok_or_else(|| CartCommandError::LineNotFound(line_id.to_string()))?;
            let outcome = manager
                .update_quantity(&line_id, stepped_quantity(current, delta))
                .await?;
            report_outcome(&outcome);
        }
        CartCommand::Remove { line_id } => {
            let outcome = manager.remove_item(&CartLineId::new(line_id)).await?;
            report_outcome(&outcome);
        }
        CartCommand::Checkout => {
            let handed_off = manager
                .go_to_checkout(|url| tracing::info!("Checkout: {url}"))
                .await?;
            if !handed_off {
                tracing::warn!("No cart to check out");
            }
        }
    }
    Ok(())
}

/// New quantity after a step, never below 1.
fn stepped_quantity(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta).max(1);
    u32::try_from(next).unwrap_or(u32::MAX)
}

fn report_outcome(outcome: &MutationOutcome) {
    match outcome {
        MutationOutcome::Updated(cart) => report(Some(cart)),
        MutationOutcome::Skipped => tracing::warn!("No cart yet, nothing to change"),
        MutationOutcome::Reset => tracing::warn!("The cart had expired and was cleared"),
    }
}

fn report(cart: Option<&Cart>) {
    let Some(cart) = cart else {
        tracing::info!("Cart is empty");
        return;
    };

    tracing::info!(
        "Cart {} - {} item(s), total {}",
        cart.id,
        cart.item_count(),
        cart.total().display()
    );
    for line in &cart.lines {
        match &line.merchandise {
            Some(merchandise) => tracing::info!(
                "  {} x {}{} @ {} [{}]",
                line.quantity,
                merchandise.product.title,
                merchandise
                    .variant_title()
                    .map(|title| format!(" ({title})"))
                    .unwrap_or_default(),
                merchandise.price.display(),
                line.id
            ),
            None => tracing::info!("  {} x (unknown item) [{}]", line.quantity, line.id),
        }
    }
}
