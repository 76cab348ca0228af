//! Core types for Verger.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;

pub use cart::{Cart, CartCost, CartLine, Image, Merchandise, MerchandiseProduct};
pub use catalog::{
    Collection, DEFAULT_CATEGORY, ProductDetail, ProductImage, ProductSummary, ProductVariant,
    resolve_category,
};
pub use id::*;
pub use price::{CurrencyCode, CurrencyCodeError, Money};
