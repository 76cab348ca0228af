//! Integration tests for Verger.
//!
//! Everything runs in-process: a fake Shopify Storefront GraphQL server and
//! the real storefront router, each on an ephemeral port.
//!
//! ```rust,ignore
//! let ctx = TestContext::start().await;
//! let remote = HttpCartRemote::new(ctx.cart_endpoint(), Duration::from_secs(5))?;
//! ctx.shopify.expire_all();
//! ```
//!
//! # Test Categories
//!
//! - `cart_endpoint` - `POST /api/cart` against the fake Shopify
//! - `cart_sync` - `CartManager` over HTTP, including expiry recovery
//! - `catalog` - catalog endpoints and caching

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use secrecy::SecretString;
use serde_json::{Value, json};
use verger_storefront::config::{ShopifyStorefrontConfig, StorefrontConfig};
use verger_storefront::shopify::ACCESS_TOKEN_HEADER;
use verger_storefront::state::AppState;

/// Token the storefront is configured with.
pub const TEST_TOKEN: &str = "3f9a1c07be52d84e6a0b17fc29d5e843";

/// Unit price of every fake variant, in cents.
pub const UNIT_PRICE_CENTS: i64 = 1250;

/// Variant the fake reports as sold out.
pub const SOLD_OUT_VARIANT: &str = "gid://shopify/ProductVariant/sold-out";

/// Message Shopify returns for unknown carts.
pub const CART_MISSING_MESSAGE: &str = "The specified cart does not exist.";

#[derive(Debug, Clone)]
struct FakeLine {
    id: String,
    variant_id: String,
    quantity: i64,
}

#[derive(Debug, Clone, Default)]
struct FakeCart {
    lines: Vec<FakeLine>,
}

#[derive(Debug, Default)]
struct FakeState {
    carts: HashMap<String, FakeCart>,
    next_id: u64,
    operations: Vec<String>,
    tokens: Vec<Option<String>>,
}

/// In-memory stand-in for the Shopify Storefront GraphQL API.
#[derive(Debug, Clone, Default)]
pub struct FakeShopify {
    state: Arc<Mutex<FakeState>>,
}

impl FakeShopify {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Operation names received so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.lock().operations.clone()
    }

    /// How many times `operation` was received.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| op.as_str() == operation)
            .count()
    }

    /// Access tokens sent with each request.
    #[must_use]
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.lock().tokens.clone()
    }

    /// Forget every cart, as Shopify does when carts expire.
    pub fn expire_all(&self) {
        self.lock().carts.clear();
    }

    /// Whether the fake still knows `cart_id`.
    #[must_use]
    pub fn has_cart(&self, cart_id: &str) -> bool {
        self.lock().carts.contains_key(cart_id)
    }

    /// Router answering GraphQL POSTs.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/graphql", post(graphql))
            .with_state(self.clone())
    }

    fn handle(&self, operation: &str, variables: &Value) -> Value {
        let mut state = self.lock();
        match operation {
            "CreateCart" => {
                state.next_id += 1;
                let id = format!("gid://shopify/Cart/{}", state.next_id);
                state.carts.insert(id.clone(), FakeCart::default());
                let cart = render_cart(&id, &FakeCart::default());
                json!({"data": {"cartCreate": {"cart": cart, "userErrors": []}}})
            }
            "AddCartLines" => {
                mutate_cart(&mut state, variables, "cartLinesAdd", |state, cart_id| {
                    let lines = variables["lines"].as_array().cloned().unwrap_or_default();
                    for line in lines {
                        let variant_id = line["merchandiseId"].as_str().unwrap_or_default();
                        if variant_id == SOLD_OUT_VARIANT {
                            return Err(("The merchandise is sold out.", "MERCHANDISE_SOLD_OUT"));
                        }
                        let quantity = line["quantity"].as_i64().unwrap_or(1);
                        state.next_id += 1;
                        let next = state.next_id;
                        let Some(cart) = state.carts.get_mut(cart_id) else {
                            continue;
                        };
                        if let Some(existing) =
                            cart.lines.iter_mut().find(|l| l.variant_id == variant_id)
                        {
                            existing.quantity += quantity;
                        } else {
                            cart.lines.push(FakeLine {
                                id: format!("gid://shopify/CartLine/{next}"),
                                variant_id: variant_id.to_string(),
                                quantity,
                            });
                        }
                    }
                    Ok(())
                })
            }
            "UpdateCartLines" => {
                mutate_cart(&mut state, variables, "cartLinesUpdate", |state, cart_id| {
                    let Some(cart) = state.carts.get_mut(cart_id) else {
                        return Ok(());
                    };
                    for update in variables["lines"].as_array().into_iter().flatten() {
                        let line_id = update["id"].as_str().unwrap_or_default();
                        let quantity = update["quantity"].as_i64().unwrap_or(0);
                        if quantity == 0 {
                            cart.lines.retain(|l| l.id != line_id);
                        } else if let Some(line) = cart.lines.iter_mut().find(|l| l.id == line_id)
                        {
                            line.quantity = quantity;
                        }
                    }
                    Ok(())
                })
            }
            "RemoveCartLines" => {
                mutate_cart(&mut state, variables, "cartLinesRemove", |state, cart_id| {
                    let Some(cart) = state.carts.get_mut(cart_id) else {
                        return Ok(());
                    };
                    for line_id in variables["lineIds"].as_array().into_iter().flatten() {
                        cart.lines.retain(|l| Some(l.id.as_str()) != line_id.as_str());
                    }
                    Ok(())
                })
            }
            "GetProducts" => {
                let first = variables["first"].as_u64().unwrap_or(20);
                let edges: Vec<Value> = (1..=first.min(3))
                    .map(|n| json!({"node": product_summary(n)}))
                    .collect();
                json!({"data": {"products": {"edges": edges}}})
            }
            "GetProductByHandle" => {
                let handle = variables["handle"].as_str().unwrap_or_default();
                let product = (handle == "savon-1").then(product_detail);
                json!({"data": {"product": product}})
            }
            "GetCollectionByHandle" => {
                let handle = variables["handle"].as_str().unwrap_or_default();
                let collection = (handle == "bain").then(|| {
                    json!({
                        "id": "gid://shopify/Collection/1",
                        "title": "Bain",
                        "description": "",
                        "handle": "bain",
                        "products": {"edges": [{"node": product_summary(1)}]}
                    })
                });
                json!({"data": {"collection": collection}})
            }
            other => json!({
                "errors": [{"message": format!("Unknown operation {other}")}]
            }),
        }
    }
}

type MutationError = (&'static str, &'static str);

/// Run `apply` against the cart named in `variables`, answering with the
/// payload shape Shopify uses under `field`.
fn mutate_cart<F>(state: &mut FakeState, variables: &Value, field: &str, apply: F) -> Value
where
    F: FnOnce(&mut FakeState, &str) -> Result<(), MutationError>,
{
    let cart_id = variables["cartId"].as_str().unwrap_or_default().to_string();

    if !state.carts.contains_key(&cart_id) {
        return json!({"data": {field: {
            "cart": null,
            "userErrors": [{"field": ["cartId"], "message": CART_MISSING_MESSAGE, "code": "INVALID"}]
        }}});
    }

    if let Err((message, code)) = apply(&mut *state, cart_id.as_str()) {
        return json!({"data": {field: {
            "cart": null,
            "userErrors": [{"field": ["lines"], "message": message, "code": code}]
        }}});
    }

    let cart = state
        .carts
        .get(&cart_id)
        .map(|cart| render_cart(&cart_id, cart));
    json!({"data": {field: {"cart": cart, "userErrors": []}}})
}

fn money(cents: i64) -> Value {
    json!({"amount": format!("{}.{:02}", cents / 100, cents % 100), "currencyCode": "EUR"})
}

fn render_cart(id: &str, cart: &FakeCart) -> Value {
    let total_quantity: i64 = cart.lines.iter().map(|l| l.quantity).sum();
    let edges: Vec<Value> = cart
        .lines
        .iter()
        .map(|line| {
            json!({"node": {
                "id": line.id,
                "quantity": line.quantity,
                "merchandise": {
                    "id": line.variant_id,
                    "title": "Default Title",
                    "price": money(UNIT_PRICE_CENTS),
                    "product": {"title": "Savon", "featuredImage": null}
                }
            }})
        })
        .collect();

    json!({
        "id": id,
        "checkoutUrl": format!("https://shop.example/cart/c/{}", id.rsplit('/').next().unwrap_or(id)),
        "totalQuantity": total_quantity,
        "lines": {"edges": edges},
        "cost": {
            "totalAmount": money(total_quantity * UNIT_PRICE_CENTS),
            "subtotalAmount": money(total_quantity * UNIT_PRICE_CENTS)
        }
    })
}

fn product_summary(n: u64) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{n}"),
        "title": format!("Savon {n}"),
        "handle": format!("savon-{n}"),
        "description": "Savon artisanal",
        "priceRange": {"minVariantPrice": money(UNIT_PRICE_CENTS)},
        "images": {"edges": []},
        "variants": {"edges": [{"node": {"id": format!("gid://shopify/ProductVariant/{n}")}}]},
        "tags": ["bio"],
        "productType": "Bain",
        "category": null
    })
}

fn product_detail() -> Value {
    json!({
        "id": "gid://shopify/Product/1",
        "title": "Savon 1",
        "handle": "savon-1",
        "description": "Savon artisanal",
        "descriptionHtml": "<p>Savon artisanal</p>",
        "priceRange": {"minVariantPrice": money(UNIT_PRICE_CENTS)},
        "images": {"edges": [{"node": {"url": "https://cdn.example/savon-1.jpg", "altText": null}}]},
        "variants": {"edges": [{"node": {
            "id": "gid://shopify/ProductVariant/1",
            "title": "Default Title",
            "price": money(UNIT_PRICE_CENTS),
            "availableForSale": true
        }}]},
        "tags": [],
        "productType": null,
        "category": {"name": "Soap"}
    })
}

async fn graphql(
    State(fake): State<FakeShopify>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let operation = body["operationName"].as_str().unwrap_or_default().to_string();
    let token = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    {
        let mut state = fake.lock();
        state.operations.push(operation.clone());
        state.tokens.push(token);
    }
    Json(fake.handle(&operation, &body["variables"]))
}

/// Serve `router` on an ephemeral local port.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("failed to bind test listener: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("no local address: {e}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// A running fake Shopify plus a storefront pointed at it.
pub struct TestContext {
    pub shopify: FakeShopify,
    pub shopify_addr: SocketAddr,
    pub storefront_addr: SocketAddr,
}

impl TestContext {
    /// Start both servers.
    ///
    /// # Panics
    ///
    /// Panics if a server cannot start.
    pub async fn start() -> Self {
        let shopify = FakeShopify::default();
        let shopify_addr = serve(shopify.router()).await;

        let state = AppState::new(storefront_config(shopify_addr))
            .unwrap_or_else(|e| panic!("failed to build storefront state: {e}"));
        let storefront_addr = serve(verger_storefront::app(state)).await;

        Self {
            shopify,
            shopify_addr,
            storefront_addr,
        }
    }

    /// URL of the storefront's cart endpoint.
    #[must_use]
    pub fn cart_endpoint(&self) -> String {
        format!("http://{}/api/cart", self.storefront_addr)
    }

    /// URL of a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.storefront_addr)
    }
}

/// Storefront configuration targeting a fake Shopify at `shopify_addr`.
#[must_use]
pub fn storefront_config(shopify_addr: SocketAddr) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        shopify: ShopifyStorefrontConfig {
            store: "verger-test.myshopify.com".to_string(),
            api_version: "2024-10".to_string(),
            endpoint: Some(format!("http://{shopify_addr}/graphql")),
            storefront_token: SecretString::from(TEST_TOKEN),
            request_timeout: Duration::from_secs(5),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}
