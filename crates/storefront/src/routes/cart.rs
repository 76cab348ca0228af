//! Cart mutation endpoint.
//!
//! `POST /api/cart` takes `{ action, cartId?, variantId?, lineId?, quantity? }`
//! and answers `{ cart }` with the full Shopify snapshot, or an
//! `{ error, code }` body. Upstream failures are 500s whose `error` is
//! Shopify's message verbatim.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::instrument;

use crate::cart::{CartAction, CartActionRequest, CartResponse};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Apply one cart action.
#[instrument(skip(state, payload))]
pub async fn mutate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CartActionRequest>, JsonRejection>,
) -> Result<Json<CartResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let action = CartAction::try_from(request)?;

    let data = action.cart_id().map(|id| [("cart_id", id.as_str())]);
    add_breadcrumb("cart", action.name(), data.as_ref().map(<[_; 1]>::as_slice));

    let carts = state.carts();
    let cart = match &action {
        CartAction::Create => carts.create_cart().await?,
        CartAction::Add {
            cart_id,
            merchandise_id,
            quantity,
        } => carts.add_line(cart_id, merchandise_id, *quantity).await?,
        CartAction::Update {
            cart_id,
            line_id,
            quantity,
        } => carts.update_line(cart_id, line_id, *quantity).await?,
        CartAction::Remove { cart_id, line_id } => carts.remove_line(cart_id, line_id).await?,
    };

    tracing::debug!(
        action = action.name(),
        cart_id = %cart.id,
        lines = cart.lines.len(),
        "Cart action applied"
    );

    Ok(Json(CartResponse { cart }))
}
