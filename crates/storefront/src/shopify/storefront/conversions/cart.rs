//! Cart conversion functions.

use verger_core::{
    Cart, CartCost, CartId, CartLine, CartLineId, Image, Merchandise, MerchandiseId,
    MerchandiseProduct,
};

use crate::shopify::ShopifyError;
use crate::shopify::storefront::queries::{
    CartFields, CartLineFields, CartMerchandiseFields, ImageFields, UserError,
};

/// Convert the `CartFields` selection into a cart snapshot.
///
/// `edges { node }` is flattened into `lines`. Negative or oversized
/// quantities (never sent by Shopify) collapse to 0.
pub fn convert_cart(cart: CartFields) -> Cart {
    Cart {
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        total_quantity: u32::try_from(cart.total_quantity).unwrap_or(0),
        lines: cart.lines.into_nodes().map(convert_line).collect(),
        cost: CartCost {
            total_amount: cart.cost.total_amount,
            subtotal_amount: cart.cost.subtotal_amount,
        },
    }
}

fn convert_line(line: CartLineFields) -> CartLine {
    CartLine {
        id: CartLineId::new(line.id),
        quantity: u32::try_from(line.quantity).unwrap_or(0),
        merchandise: line.merchandise.and_then(convert_merchandise),
    }
}

/// Only `ProductVariant` merchandise carries the selected fields; anything
/// else arrives as an empty object and maps to `None`.
fn convert_merchandise(merchandise: CartMerchandiseFields) -> Option<Merchandise> {
    let id = merchandise.id?;
    let price = merchandise.price?;
    let product = merchandise.product?;

    Some(Merchandise {
        id: MerchandiseId::new(id),
        title: merchandise.title.unwrap_or_default(),
        price,
        product: MerchandiseProduct {
            title: product.title,
            image: product.featured_image.map(convert_image),
        },
    })
}

fn convert_image(image: ImageFields) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}

/// Turn a mutation's `userErrors` into an error carrying the first message.
///
/// Returns `None` when the list is empty.
pub fn first_user_error(user_errors: Vec<UserError>) -> Option<ShopifyError> {
    let total = user_errors.len();
    let first = user_errors.into_iter().next()?;

    if total > 1 {
        tracing::debug!(total, "Mutation returned several user errors, surfacing the first");
    }

    Some(ShopifyError::UserError {
        message: first.message,
        code: first.code,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn cart_json(merchandise: &serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Cart/1",
            "checkoutUrl": "https://shop.example/c/abc",
            "totalQuantity": 3,
            "lines": {"edges": [
                {"node": {"id": "gid://shopify/CartLine/1", "quantity": 2, "merchandise": merchandise}},
                {"node": {"id": "gid://shopify/CartLine/2", "quantity": 1, "merchandise": {}}}
            ]},
            "cost": {
                "totalAmount": {"amount": "59.70", "currencyCode": "EUR"},
                "subtotalAmount": {"amount": "49.75", "currencyCode": "EUR"}
            }
        })
    }

    #[test]
    fn test_convert_cart_flattens_lines() {
        let merchandise = serde_json::json!({
            "id": "gid://shopify/ProductVariant/7",
            "title": "250 g",
            "price": {"amount": "19.90", "currencyCode": "EUR"},
            "product": {
                "title": "Savon",
                "featuredImage": {"url": "https://cdn.example/s.jpg", "altText": null}
            }
        });
        let fields: CartFields = serde_json::from_value(cart_json(&merchandise)).unwrap();
        let cart = convert_cart(fields);

        assert_eq!(cart.id.as_str(), "gid://shopify/Cart/1");
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total().amount, Decimal::new(5970, 2));

        let first = cart.lines.first().unwrap();
        let merchandise = first.merchandise.as_ref().unwrap();
        assert_eq!(merchandise.id.as_str(), "gid://shopify/ProductVariant/7");
        assert_eq!(merchandise.product.title, "Savon");
        assert!(merchandise.product.image.as_ref().unwrap().alt_text.is_none());
    }

    #[test]
    fn test_non_variant_merchandise_is_dropped() {
        let fields: CartFields =
            serde_json::from_value(cart_json(&serde_json::json!({}))).unwrap();
        let cart = convert_cart(fields);
        assert!(cart.lines.iter().all(|line| line.merchandise.is_none()));
    }

    #[test]
    fn test_first_user_error() {
        assert!(first_user_error(vec![]).is_none());

        let errors = vec![
            UserError {
                field: Some(vec!["cartId".to_string()]),
                message: "The specified cart does not exist.".to_string(),
                code: Some("INVALID".to_string()),
            },
            UserError {
                field: None,
                message: "second".to_string(),
                code: None,
            },
        ];
        let err = first_user_error(errors).unwrap();
        match err {
            ShopifyError::UserError { message, code } => {
                assert_eq!(message, "The specified cart does not exist.");
                assert_eq!(code.as_deref(), Some("INVALID"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
