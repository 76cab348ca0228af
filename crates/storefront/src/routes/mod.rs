//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Cart
//! POST /api/cart                    - Cart mutation (create/add/update/remove)
//!
//! # Catalog (JSON, cached)
//! GET  /api/products?first=N        - Product listing (default 20)
//! GET  /api/products/{handle}       - Product detail
//! GET  /api/collections/{handle}?first=N - Collection with products (default 50)
//! ```

pub mod cart;
pub mod catalog;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", post(cart::mutate))
        .route("/products", get(catalog::products))
        .route("/products/{handle}", get(catalog::product))
        .route("/collections/{handle}", get(catalog::collection))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use tower::ServiceExt;
    use verger_core::{
        Cart, CartCost, CartId, CartLine, CartLineId, CurrencyCode, MerchandiseId, Money,
    };

    use super::*;
    use crate::cart::{CartRemote, CartResponse, ErrorResponse, SyncError};
    use crate::config::{ShopifyStorefrontConfig, StorefrontConfig};
    use crate::shopify::StorefrontClient;

    /// Remote that records calls and answers with one fixed result.
    struct FixedRemote {
        result: Result<Cart, SyncError>,
        calls: Mutex<Vec<String>>,
    }

    impl FixedRemote {
        fn answer(&self, call: String) -> Result<Cart, SyncError> {
            self.calls.lock().unwrap().push(call);
            self.result.clone()
        }
    }

    #[async_trait]
    impl CartRemote for FixedRemote {
        async fn create_cart(&self) -> Result<Cart, SyncError> {
            self.answer("create".to_string())
        }

        async fn add_line(
            &self,
            cart_id: &CartId,
            merchandise_id: &MerchandiseId,
            quantity: u32,
        ) -> Result<Cart, SyncError> {
            self.answer(format!("add {cart_id} {merchandise_id} {quantity}"))
        }

        async fn update_line(
            &self,
            cart_id: &CartId,
            line_id: &CartLineId,
            quantity: u32,
        ) -> Result<Cart, SyncError> {
            self.answer(format!("update {cart_id} {line_id} {quantity}"))
        }

        async fn remove_line(
            &self,
            cart_id: &CartId,
            line_id: &CartLineId,
        ) -> Result<Cart, SyncError> {
            self.answer(format!("remove {cart_id} {line_id}"))
        }
    }

    fn sample_cart() -> Cart {
        Cart {
            id: CartId::new("gid://shopify/Cart/1"),
            checkout_url: "https://shop.example/c/1".to_string(),
            total_quantity: 2,
            lines: vec![CartLine {
                id: CartLineId::new("gid://shopify/CartLine/1"),
                quantity: 2,
                merchandise: None,
            }],
            cost: CartCost {
                total_amount: Money::new(Decimal::new(3980, 2), CurrencyCode::default()),
                subtotal_amount: None,
            },
        }
    }

    fn app(result: Result<Cart, SyncError>) -> (Router, Arc<FixedRemote>) {
        let shopify = ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2024-10".to_string(),
            // Nothing listens here; catalog calls are not exercised
            endpoint: Some("http://127.0.0.1:9/graphql".to_string()),
            storefront_token: SecretString::from("3f9a1c07be52d84e6a0b17fc29d5e843"),
            request_timeout: Duration::from_secs(1),
        };
        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            shopify,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let remote = Arc::new(FixedRemote {
            result,
            calls: Mutex::default(),
        });
        let storefront = StorefrontClient::new(&config.shopify).unwrap();
        let state = AppState::with_cart_remote(config, storefront, remote.clone());
        (routes().with_state(state), remote)
    }

    async fn post_cart(app: Router, body: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::post("/api/cart")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(Ok(sample_cart()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_add_returns_cart() {
        let (app, remote) = app(Ok(sample_cart()));
        let (status, body) = post_cart(
            app,
            r#"{"action":"add","cartId":"gid://shopify/Cart/1","variantId":"gid://shopify/ProductVariant/9"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: CartResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.cart, sample_cart());
        assert_eq!(
            remote.calls.lock().unwrap().as_slice(),
            ["add gid://shopify/Cart/1 gid://shopify/ProductVariant/9 1"]
        );
    }

    #[tokio::test]
    async fn test_missing_fields_are_400_without_remote_call() {
        for (body, message) in [
            (r#"{"action":"add","cartId":"c1"}"#, "cartId and variantId are required"),
            (
                r#"{"action":"update","cartId":"c1","lineId":"l1"}"#,
                "cartId, lineId, and quantity are required",
            ),
            (r#"{"action":"remove","lineId":"l1"}"#, "cartId and lineId are required"),
            (r#"{"action":"explode"}"#, "Invalid action"),
        ] {
            let (app, remote) = app(Ok(sample_cart()));
            let (status, bytes) = post_cart(app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(error.error, message);
            assert!(remote.calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let (app, _) = app(Ok(sample_cart()));
        let (status, _) = post_cart(app, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expired_cart_is_500_with_verbatim_message() {
        let (app, _) = app(Err(SyncError::ExpiredCart(
            "The specified cart does not exist.".to_string(),
        )));
        let (status, bytes) = post_cart(
            app,
            r#"{"action":"update","cartId":"c1","lineId":"l1","quantity":0}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.error, "The specified cart does not exist.");
        assert_eq!(error.code.as_deref(), Some("CART_NOT_FOUND"));
    }
}
