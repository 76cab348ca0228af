//! Conversions from raw Storefront API selections to `verger-core` types.

pub mod cart;
pub mod products;

pub use cart::{convert_cart, first_user_error};
pub use products::{convert_collection, convert_product, convert_product_summary};
