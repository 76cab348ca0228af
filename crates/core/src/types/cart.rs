//! Cart snapshot types.
//!
//! A [`Cart`] is always a complete snapshot returned by the remote cart
//! service. Nothing in the workspace edits one in place: every successful
//! mutation hands back a new snapshot that replaces the old one wholesale.
//!
//! The serialized form is camelCase and mirrors the Storefront API field
//! names, with the GraphQL `edges { node }` nesting flattened into a plain
//! `lines` array.

use serde::{Deserialize, Serialize};

use super::id::{CartId, CartLineId, MerchandiseId};
use super::price::Money;

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// Parent product of a purchased variant (display data only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProduct {
    /// Product title.
    pub title: String,
    /// First product image, if any.
    #[serde(default)]
    pub image: Option<Image>,
}

/// Denormalized snapshot of the variant on a cart line.
///
/// Read-only display data. The cart's [`CartCost`] is the authoritative price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchandise {
    /// Variant ID.
    pub id: MerchandiseId,
    /// Variant title ("Default Title" for single-variant products).
    pub title: String,
    /// Unit price at the time of the snapshot.
    pub price: Money,
    /// Parent product.
    pub product: MerchandiseProduct,
}

impl Merchandise {
    /// Variant title, or `None` for Shopify's placeholder "Default Title".
    #[must_use]
    pub fn variant_title(&self) -> Option<&str> {
        if self.title == "Default Title" {
            None
        } else {
            Some(&self.title)
        }
    }
}

/// One entry of a cart: a variant and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Remote line ID, unique within the cart.
    pub id: CartLineId,
    /// Quantity, at least 1.
    pub quantity: u32,
    /// Purchased variant. Absent for lines created without merchandise
    /// details (a fresh `cartCreate` returns no lines at all).
    #[serde(default)]
    pub merchandise: Option<Merchandise>,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    /// Total amount, taxes and discounts included.
    pub total_amount: Money,
    /// Subtotal before taxes and shipping.
    #[serde(default)]
    pub subtotal_amount: Option<Money>,
}

/// A shopping cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Remote cart handle.
    pub id: CartId,
    /// Hosted checkout URL. Opaque; only used for the checkout redirect.
    pub checkout_url: String,
    /// Quantity as reported by the remote. Display only, see [`Cart::item_count`].
    #[serde(default)]
    pub total_quantity: u32,
    /// Cart lines in remote order.
    #[serde(default)]
    pub lines: Vec<CartLine>,
    /// Cost summary.
    pub cost: CartCost,
}

impl Cart {
    /// Number of items in the cart: the sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Cart total.
    #[must_use]
    pub const fn total(&self) -> &Money {
        &self.cost.total_amount
    }

    /// Find a line by its ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether a checkout handoff is possible.
    #[must_use]
    pub fn has_checkout_url(&self) -> bool {
        !self.checkout_url.trim().is_empty()
    }
}
