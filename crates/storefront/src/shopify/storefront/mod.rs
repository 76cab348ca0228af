//! Shopify Storefront API client implementation.
//!
//! Uses hand-written `graphql_client` query documents with `reqwest` 0.13 for
//! HTTP. Catalog reads are cached using `moka`; cart mutations never are.

mod cache;
mod conversions;

pub mod queries;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, PathFragment, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use verger_core::{
    Cart, CartId, CartLineId, Collection, MerchandiseId, ProductDetail, ProductSummary,
};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::{CacheKey, CacheValue, CatalogExpiry};
use conversions::{
    convert_cart, convert_collection, convert_product, convert_product_summary, first_user_error,
};
use queries::{
    AddCartLines, CartMutationPayload, CreateCart, GetCollectionByHandle, GetProductByHandle,
    GetProducts, RemoveCartLines, UpdateCartLines, add_cart_lines, create_cart,
    get_collection_by_handle, get_product_by_handle, get_products, remove_cart_lines,
    update_cart_lines,
};

/// Header carrying the Storefront API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Default page size for product listings.
pub const DEFAULT_PRODUCTS_FIRST: i64 = 20;

/// Default page size for collection products.
pub const DEFAULT_COLLECTION_FIRST: i64 = 50;

/// Largest page size the Storefront API accepts.
const MAX_PAGE_SIZE: i64 = 250;

/// Bytes of a failed response body kept for logs and errors.
const BODY_PREVIEW_CHARS: usize = 500;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides typed access to cart mutations and catalog reads. Cheap to
/// clone; clones share the HTTP connection pool and the catalog cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialization).
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .expire_after(CatalogExpiry)
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.graphql_endpoint(),
                access_token: config.storefront_token.clone(),
                cache,
            }),
        })
    }

    /// GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);
        let operation = request_body.operation_name;

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let body = preview(&response_text);
            tracing::error!(
                status = %status,
                operation,
                body = %body,
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation,
                    body = %preview(&response_text),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        // Any top-level error fails the operation, even alongside data
        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, operation, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(convert_graphql_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation,
                body = %preview(&response_text),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::EmptyResponse(format!("{operation} returned no data"))
        })
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new, empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or user errors are returned.
    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables::default())
            .await?;
        let cart = cart_from_payload(data.cart_create, "cartCreate")?;
        debug!(cart_id = %cart.id, "Created cart");
        Ok(cart)
    }

    /// Add a variant to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or user errors are returned
    /// (unknown variant, expired cart).
    #[instrument(skip(self), fields(cart_id = %cart_id, merchandise_id = %merchandise_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &CartId,
        merchandise_id: &MerchandiseId,
        quantity: u32,
    ) -> Result<Cart, ShopifyError> {
        let variables = add_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: vec![add_cart_lines::CartLineInput {
                merchandise_id: merchandise_id.to_string(),
                quantity: i64::from(quantity),
            }],
        };

        let data = self.execute::<AddCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_add, "cartLinesAdd")
    }

    /// Set the quantity of a cart line. Shopify removes the line at 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or user errors are returned.
    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    pub async fn update_cart_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<Cart, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: vec![update_cart_lines::CartLineUpdateInput {
                id: line_id.to_string(),
                quantity: i64::from(quantity),
            }],
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_update, "cartLinesUpdate")
    }

    /// Remove a line from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or user errors are returned.
    #[instrument(skip(self), fields(cart_id = %cart_id, line_id = %line_id))]
    pub async fn remove_cart_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
    ) -> Result<Cart, ShopifyError> {
        let variables = remove_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            line_ids: vec![line_id.to_string()],
        };

        let data = self.execute::<RemoveCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_remove, "cartLinesRemove")
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get the first `first` products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, first: i64) -> Result<Vec<ProductSummary>, ShopifyError> {
        let first = clamp_page_size(first);
        let cache_key = CacheKey::Products { first };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let data = self
            .execute::<GetProducts>(get_products::Variables { first })
            .await?;

        let products: Vec<ProductSummary> = data
            .products
            .into_nodes()
            .map(convert_product_summary)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<ProductDetail, ShopifyError> {
        let cache_key = CacheKey::Product(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };
        let data = self.execute::<GetProductByHandle>(variables).await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a collection and its first `first` products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: i64,
    ) -> Result<Collection, ShopifyError> {
        let first = clamp_page_size(first);
        let cache_key = CacheKey::Collection {
            handle: handle.to_string(),
            first,
        };

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let variables = get_collection_by_handle::Variables {
            handle: handle.to_string(),
            first,
        };
        let data = self.execute::<GetCollectionByHandle>(variables).await?;

        let collection = data
            .collection
            .map(convert_collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extract the cart from a mutation payload, failing on the first user error.
fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    operation: &str,
) -> Result<Cart, ShopifyError> {
    let payload = payload
        .ok_or_else(|| ShopifyError::EmptyResponse(format!("{operation} returned no payload")))?;

    if let Some(err) = first_user_error(payload.user_errors) {
        return Err(err);
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::EmptyResponse(format!("{operation} returned no cart")))
}

fn convert_graphql_error(error: graphql_client::Error) -> GraphQLError {
    let code = error
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .and_then(|code| code.as_str())
        .map(str::to_string);

    GraphQLError {
        message: error.message,
        locations: error.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: error.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(s) => serde_json::Value::String(s),
                    PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
        code,
    }
}

const fn clamp_page_size(first: i64) -> i64 {
    if first < 1 {
        1
    } else if first > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        first
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
