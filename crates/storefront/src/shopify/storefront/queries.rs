//! GraphQL documents for the Shopify Storefront API.
//!
//! Each operation is a marker type implementing [`GraphQLQuery`] with a
//! sibling module holding its `Variables` and `ResponseData`, the same layout
//! `graphql_client` codegen produces. Cart mutations share the `CartFields`
//! fragment so every mutation returns the full snapshot.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Fields selected on every cart returned by a mutation.
macro_rules! cart_fields_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        merchandise {
          ... on ProductVariant {
            id
            title
            price { amount currencyCode }
            product {
              title
              featuredImage { url altText }
            }
          }
        }
      }
    }
  }
  cost {
    totalAmount { amount currencyCode }
    subtotalAmount { amount currencyCode }
  }
}
"
    };
}

/// Fields selected on products in listings and collections.
macro_rules! product_summary_fragment {
    () => {
        r"
fragment ProductSummaryFields on Product {
  id
  title
  handle
  description
  priceRange { minVariantPrice { amount currencyCode } }
  images(first: 1) { edges { node { url altText } } }
  variants(first: 1) { edges { node { id } } }
  tags
  productType
  category { name }
}
"
    };
}

/// Implements [`GraphQLQuery`] for a marker type whose sibling module
/// declares `Variables`, `ResponseData` and `QUERY`.
macro_rules! graphql_operation {
    ($name:ident, $module:ident) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: stringify!($name),
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// Relay-style connection as returned by Shopify.
#[derive(Debug, Clone, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    /// Flatten `edges { node }` into the nodes.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|e| e.node)
    }
}

/// Edge of a [`Connection`].
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// `CartUserError` / `UserError` entry of a mutation payload.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Image selection (`url`, `altText`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// `MoneyV2` selection.
pub type MoneyFields = verger_core::Money;

/// Selection of the `CartFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    #[serde(default)]
    pub total_quantity: i64,
    pub lines: Connection<CartLineFields>,
    pub cost: CartCostFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    /// Empty object when the merchandise is not a `ProductVariant`.
    #[serde(default)]
    pub merchandise: Option<CartMerchandiseFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartMerchandiseFields {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<MoneyFields>,
    #[serde(default)]
    pub product: Option<CartMerchandiseProductFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandiseProductFields {
    pub title: String,
    #[serde(default)]
    pub featured_image: Option<ImageFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub total_amount: MoneyFields,
    #[serde(default)]
    pub subtotal_amount: Option<MoneyFields>,
}

/// Common shape of `cartCreate`, `cartLinesAdd`, `cartLinesUpdate` and
/// `cartLinesRemove` payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    #[serde(default)]
    pub cart: Option<CartFields>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

/// Selection of the `ProductSummaryFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummaryFields {
    pub id: String,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub description: String,
    pub price_range: PriceRangeFields,
    pub images: Connection<ImageFields>,
    pub variants: Connection<VariantIdFields>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeFields {
    pub min_variant_price: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantIdFields {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFields {
    pub name: String,
}

// =============================================================================
// Cart mutations
// =============================================================================

graphql_operation!(CreateCart, create_cart);

pub mod create_cart {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const QUERY: &str = concat!(
        r"
mutation CreateCart {
  cartCreate {
    cart { ...CartFields }
    userErrors { field message code }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {}

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

graphql_operation!(AddCartLines, add_cart_lines);

pub mod add_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const QUERY: &str = concat!(
        r"
mutation AddCartLines($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message code }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

graphql_operation!(UpdateCartLines, update_cart_lines);

pub mod update_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const QUERY: &str = concat!(
        r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message code }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartLineUpdateInput {
        pub id: String,
        pub quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

graphql_operation!(RemoveCartLines, remove_cart_lines);

pub mod remove_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const QUERY: &str = concat!(
        r"
mutation RemoveCartLines($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { field message code }
  }
}
",
        cart_fields_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

// =============================================================================
// Catalog queries
// =============================================================================

graphql_operation!(GetProducts, get_products);

pub mod get_products {
    use super::{Connection, Deserialize, ProductSummaryFields, Serialize};

    pub const QUERY: &str = concat!(
        r"
query GetProducts($first: Int!) {
  products(first: $first) {
    edges { node { ...ProductSummaryFields } }
  }
}
",
        product_summary_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductSummaryFields>,
    }
}

graphql_operation!(GetProductByHandle, get_product_by_handle);

pub mod get_product_by_handle {
    use super::{
        CategoryFields, Connection, Deserialize, ImageFields, MoneyFields, PriceRangeFields,
        Serialize,
    };

    pub const QUERY: &str = r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) {
    id
    title
    handle
    description
    descriptionHtml
    priceRange { minVariantPrice { amount currencyCode } }
    images(first: 5) { edges { node { url altText } } }
    variants(first: 10) {
      edges {
        node {
          id
          title
          price { amount currencyCode }
          availableForSale
        }
      }
    }
    tags
    productType
    category { name }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductFields {
        pub id: String,
        pub title: String,
        pub handle: String,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub description_html: String,
        pub price_range: PriceRangeFields,
        pub images: Connection<ImageFields>,
        pub variants: Connection<VariantFields>,
        #[serde(default)]
        pub tags: Vec<String>,
        #[serde(default)]
        pub product_type: Option<String>,
        #[serde(default)]
        pub category: Option<CategoryFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantFields {
        pub id: String,
        pub title: String,
        pub price: MoneyFields,
        pub available_for_sale: bool,
    }
}

graphql_operation!(GetCollectionByHandle, get_collection_by_handle);

pub mod get_collection_by_handle {
    use super::{Connection, Deserialize, ProductSummaryFields, Serialize};

    pub const QUERY: &str = concat!(
        r"
query GetCollectionByHandle($handle: String!, $first: Int!) {
  collection(handle: $handle) {
    id
    title
    description
    handle
    products(first: $first) {
      edges { node { ...ProductSummaryFields } }
    }
  }
}
",
        product_summary_fragment!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionFields {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub description: String,
        pub handle: String,
        pub products: Connection<ProductSummaryFields>,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_mutations_include_fragment() {
        for query in [
            create_cart::QUERY,
            add_cart_lines::QUERY,
            update_cart_lines::QUERY,
            remove_cart_lines::QUERY,
        ] {
            assert!(query.contains("...CartFields"));
            assert!(query.contains("fragment CartFields on Cart"));
            assert!(query.contains("userErrors { field message code }"));
        }
    }

    #[test]
    fn test_build_query_sets_operation_name() {
        let body = AddCartLines::build_query(add_cart_lines::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            lines: vec![add_cart_lines::CartLineInput {
                merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
                quantity: 2,
            }],
        });
        assert_eq!(body.operation_name, "AddCartLines");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/1");
        assert_eq!(
            json["variables"]["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/1"
        );
        assert_eq!(json["variables"]["lines"][0]["quantity"], 2);
    }

    #[test]
    fn test_create_cart_variables_serialize_as_empty_object() {
        let body = CreateCart::build_query(create_cart::Variables::default());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"], serde_json::json!({}));
    }

    #[test]
    fn test_cart_payload_deserializes() {
        let json = serde_json::json!({
            "cartLinesAdd": {
                "cart": {
                    "id": "gid://shopify/Cart/1",
                    "checkoutUrl": "https://shop.example/c/abc",
                    "totalQuantity": 1,
                    "lines": {"edges": [{"node": {
                        "id": "gid://shopify/CartLine/1",
                        "quantity": 1,
                        "merchandise": {
                            "id": "gid://shopify/ProductVariant/1",
                            "title": "Default Title",
                            "price": {"amount": "12.0", "currencyCode": "EUR"},
                            "product": {"title": "Savon", "featuredImage": null}
                        }
                    }}]},
                    "cost": {
                        "totalAmount": {"amount": "12.0", "currencyCode": "EUR"},
                        "subtotalAmount": {"amount": "12.0", "currencyCode": "EUR"}
                    }
                },
                "userErrors": []
            }
        });
        let data: add_cart_lines::ResponseData = serde_json::from_value(json).unwrap();
        let payload = data.cart_lines_add.unwrap();
        assert!(payload.user_errors.is_empty());
        let cart = payload.cart.unwrap();
        assert_eq!(cart.lines.into_nodes().count(), 1);
    }
}
