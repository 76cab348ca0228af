//! Cache types for Storefront API catalog responses.

use std::time::{Duration, Instant};

use moka::Expiry;
use verger_core::{Collection, ProductDetail, ProductSummary};

/// Time to live for product listings and collections.
pub const LISTING_TTL: Duration = Duration::from_secs(30 * 60);

/// Time to live for product detail pages.
pub const PRODUCT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products { first: i64 },
    Product(String),
    Collection { handle: String, first: i64 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<ProductSummary>),
    Product(Box<ProductDetail>),
    Collection(Box<Collection>),
}

/// Per-entry expiry: product detail lives longer than listings.
pub struct CatalogExpiry;

impl Expiry<CacheKey, CacheValue> for CatalogExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(ttl_for(value))
    }
}

const fn ttl_for(value: &CacheValue) -> Duration {
    match value {
        CacheValue::Product(_) => PRODUCT_TTL,
        CacheValue::Products(_) | CacheValue::Collection(_) => LISTING_TTL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_per_value_kind() {
        assert_eq!(ttl_for(&CacheValue::Products(vec![])), LISTING_TTL);
        assert!(PRODUCT_TTL > LISTING_TTL);
    }
}
