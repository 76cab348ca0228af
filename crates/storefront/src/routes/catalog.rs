//! Read-only catalog endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use verger_core::{Collection, ProductDetail, ProductSummary};

use crate::error::Result;
use crate::shopify::{DEFAULT_COLLECTION_FIRST, DEFAULT_PRODUCTS_FIRST};
use crate::state::AppState;

/// Page size query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub first: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: ProductDetail,
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub collection: Collection,
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductsResponse>> {
    let products = state
        .storefront()
        .get_products(query.first.unwrap_or(DEFAULT_PRODUCTS_FIRST))
        .await?;
    Ok(Json(ProductsResponse { products }))
}

/// `GET /api/products/{handle}`
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    Ok(Json(ProductResponse { product }))
}

/// `GET /api/collections/{handle}`
#[instrument(skip(state))]
pub async fn collection(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CollectionResponse>> {
    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, query.first.unwrap_or(DEFAULT_COLLECTION_FIRST))
        .await?;
    Ok(Json(CollectionResponse { collection }))
}
