//! Catalog endpoints and their cache.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;
use verger_integration_tests::TestContext;

async fn get(ctx: &TestContext, path: &str) -> (StatusCode, Value) {
    let response = reqwest::get(ctx.url(path)).await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::start().await;

    let response = reqwest::get(ctx.url("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_product_listing_is_cached() {
    let ctx = TestContext::start().await;

    let (status, body) = get(&ctx, "/api/products?first=2").await;
    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], "Savon 1");
    assert_eq!(products[0]["imageAlt"], "Savon 1");
    assert_eq!(products[0]["image"], "");
    assert_eq!(products[0]["variantId"], "gid://shopify/ProductVariant/1");
    assert_eq!(products[0]["category"], "Bain");

    let (_, again) = get(&ctx, "/api/products?first=2").await;
    assert_eq!(again, body);
    assert_eq!(ctx.shopify.count("GetProducts"), 1);

    // A different page size is a different cache entry
    get(&ctx, "/api/products?first=3").await;
    assert_eq!(ctx.shopify.count("GetProducts"), 2);
}

#[tokio::test]
async fn test_product_detail() {
    let ctx = TestContext::start().await;

    let (status, body) = get(&ctx, "/api/products/savon-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["handle"], "savon-1");
    assert_eq!(body["product"]["category"], "Soap");
    assert_eq!(body["product"]["images"][0]["alt"], "Savon 1");
    assert_eq!(body["product"]["variants"][0]["availableForSale"], true);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::start().await;

    let (status, body) = get(&ctx, "/api/products/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_collection() {
    let ctx = TestContext::start().await;

    let (status, body) = get(&ctx, "/api/collections/bain").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collection"]["title"], "Bain");
    assert_eq!(body["collection"]["products"][0]["handle"], "savon-1");

    let (status, _) = get(&ctx, "/api/collections/hiver").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
