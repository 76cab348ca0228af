//! Catalog types served by the storefront's read-only product endpoints.

use serde::{Deserialize, Serialize};

use super::id::{CollectionId, MerchandiseId, ProductId};
use super::price::Money;

/// Category shown when a product has neither a taxonomy category nor a type.
pub const DEFAULT_CATEGORY: &str = "General";

/// Product as listed in grids and collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    /// Product title.
    pub name: String,
    pub handle: String,
    pub description: String,
    /// Lowest variant price.
    pub price: Money,
    /// First image URL, empty when the product has no image.
    pub image: String,
    /// Alt text of the first image, falling back to the product title.
    pub image_alt: String,
    /// First variant, used by "add to cart" buttons on listings.
    pub variant_id: Option<MerchandiseId>,
    pub tags: Vec<String>,
    pub category: String,
}

/// Image on a product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub alt: String,
}

/// Purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: MerchandiseId,
    pub title: String,
    pub price: Money,
    pub available_for_sale: bool,
}

/// Full product for a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub handle: String,
    pub description: String,
    pub description_html: String,
    pub price: Money,
    pub images: Vec<ProductImage>,
    pub variants: Vec<ProductVariant>,
    pub tags: Vec<String>,
    pub category: String,
}

impl ProductDetail {
    /// First variant that can currently be bought.
    #[must_use]
    pub fn first_available_variant(&self) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.available_for_sale)
    }
}

/// A collection and the products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub title: String,
    pub description: String,
    pub handle: String,
    pub products: Vec<ProductSummary>,
}

/// Resolve the display category of a product.
///
/// Taxonomy category name first, then the merchant's product type, then
/// [`DEFAULT_CATEGORY`]. Blank values count as missing.
#[must_use]
pub fn resolve_category(category_name: Option<&str>, product_type: Option<&str>) -> String {
    category_name
        .filter(|s| !s.trim().is_empty())
        .or_else(|| product_type.filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_category_prefers_taxonomy() {
        assert_eq!(resolve_category(Some("Soap"), Some("Bath")), "Soap");
    }

    #[test]
    fn test_resolve_category_falls_back_to_type() {
        assert_eq!(resolve_category(None, Some("Bath")), "Bath");
        assert_eq!(resolve_category(Some(""), Some("Bath")), "Bath");
    }

    #[test]
    fn test_resolve_category_default() {
        assert_eq!(resolve_category(None, None), DEFAULT_CATEGORY);
        assert_eq!(resolve_category(None, Some("  ")), DEFAULT_CATEGORY);
    }
}
