//! JSON shapes of the `POST /api/cart` endpoint.
//!
//! Requests arrive loosely typed (every field optional, action as a string)
//! and are checked into a [`CartAction`] before anything reaches the remote.

use serde::{Deserialize, Serialize};
use verger_core::{Cart, CartId, CartLineId, MerchandiseId};

/// Code of a request the endpoint refused before calling the remote.
pub const CODE_INVALID_REQUEST: &str = "INVALID_REQUEST";

/// Raw request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl CartActionRequest {
    #[must_use]
    pub fn create() -> Self {
        Self {
            action: "create".to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn add(cart_id: &CartId, variant_id: &MerchandiseId, quantity: u32) -> Self {
        Self {
            action: "add".to_string(),
            cart_id: Some(cart_id.to_string()),
            variant_id: Some(variant_id.to_string()),
            quantity: Some(i64::from(quantity)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn update(cart_id: &CartId, line_id: &CartLineId, quantity: u32) -> Self {
        Self {
            action: "update".to_string(),
            cart_id: Some(cart_id.to_string()),
            line_id: Some(line_id.to_string()),
            quantity: Some(i64::from(quantity)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn remove(cart_id: &CartId, line_id: &CartLineId) -> Self {
        Self {
            action: "remove".to_string(),
            cart_id: Some(cart_id.to_string()),
            line_id: Some(line_id.to_string()),
            ..Self::default()
        }
    }
}

/// A checked cart endpoint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Create,
    Add {
        cart_id: CartId,
        merchandise_id: MerchandiseId,
        quantity: u32,
    },
    Update {
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    },
    Remove {
        cart_id: CartId,
        line_id: CartLineId,
    },
}

impl CartAction {
    /// Action name as sent on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
        }
    }

    /// Target cart, `None` for `create`.
    #[must_use]
    pub const fn cart_id(&self) -> Option<&CartId> {
        match self {
            Self::Create => None,
            Self::Add { cart_id, .. }
            | Self::Update { cart_id, .. }
            | Self::Remove { cart_id, .. } => Some(cart_id),
        }
    }
}

/// Why a request was refused. The display text is the 400 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCartRequest {
    #[error("cartId and variantId are required")]
    AddFieldsMissing,
    #[error("cartId, lineId, and quantity are required")]
    UpdateFieldsMissing,
    #[error("cartId and lineId are required")]
    RemoveFieldsMissing,
    #[error("quantity must be a positive integer")]
    InvalidQuantity,
    #[error("Invalid action")]
    InvalidAction,
}

impl TryFrom<CartActionRequest> for CartAction {
    type Error = InvalidCartRequest;

    fn try_from(request: CartActionRequest) -> Result<Self, Self::Error> {
        let cart_id = present(request.cart_id).map(CartId::new);
        let line_id = present(request.line_id).map(CartLineId::new);

        match request.action.as_str() {
            "create" => Ok(Self::Create),
            "add" => {
                let (Some(cart_id), Some(merchandise_id)) =
                    (cart_id, present(request.variant_id).map(MerchandiseId::new))
                else {
                    return Err(InvalidCartRequest::AddFieldsMissing);
                };
                // A missing or zero quantity adds one
                let quantity = match request.quantity {
                    None | Some(0) => 1,
                    Some(q) => {
                        u32::try_from(q).map_err(|_| InvalidCartRequest::InvalidQuantity)?
                    }
                };
                Ok(Self::Add {
                    cart_id,
                    merchandise_id,
                    quantity,
                })
            }
            "update" => {
                let (Some(cart_id), Some(line_id), Some(quantity)) =
                    (cart_id, line_id, request.quantity)
                else {
                    return Err(InvalidCartRequest::UpdateFieldsMissing);
                };
                // 0 is allowed: the remote drops the line
                let quantity =
                    u32::try_from(quantity).map_err(|_| InvalidCartRequest::InvalidQuantity)?;
                Ok(Self::Update {
                    cart_id,
                    line_id,
                    quantity,
                })
            }
            "remove" => {
                let (Some(cart_id), Some(line_id)) = (cart_id, line_id) else {
                    return Err(InvalidCartRequest::RemoveFieldsMissing);
                };
                Ok(Self::Remove { cart_id, line_id })
            }
            _ => Err(InvalidCartRequest::InvalidAction),
        }
    }
}

/// Blank strings count as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Successful endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResponse {
    pub cart: Cart,
}

/// Failed endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<CartAction, InvalidCartRequest> {
        let request: CartActionRequest = serde_json::from_str(json).unwrap();
        CartAction::try_from(request)
    }

    #[test]
    fn test_add_defaults_quantity_to_one() {
        let action = parse(r#"{"action":"add","cartId":"c1","variantId":"v1"}"#).unwrap();
        assert_eq!(
            action,
            CartAction::Add {
                cart_id: CartId::new("c1"),
                merchandise_id: MerchandiseId::new("v1"),
                quantity: 1,
            }
        );
    }

    #[test]
    fn test_add_requires_ids() {
        assert_eq!(
            parse(r#"{"action":"add","cartId":"c1"}"#),
            Err(InvalidCartRequest::AddFieldsMissing)
        );
        assert_eq!(
            parse(r#"{"action":"add","cartId":"","variantId":"v1"}"#),
            Err(InvalidCartRequest::AddFieldsMissing)
        );
    }

    #[test]
    fn test_add_treats_zero_quantity_as_one() {
        let action =
            parse(r#"{"action":"add","cartId":"c1","variantId":"v1","quantity":0}"#).unwrap();
        assert!(matches!(action, CartAction::Add { quantity: 1, .. }));

        let action =
            parse(r#"{"action":"add","cartId":"c1","variantId":"v1","quantity":4}"#).unwrap();
        assert!(matches!(action, CartAction::Add { quantity: 4, .. }));

        assert_eq!(
            parse(r#"{"action":"add","cartId":"c1","variantId":"v1","quantity":-1}"#),
            Err(InvalidCartRequest::InvalidQuantity)
        );
    }

    #[test]
    fn test_update_accepts_zero_but_not_absent_quantity() {
        let action =
            parse(r#"{"action":"update","cartId":"c1","lineId":"l1","quantity":0}"#).unwrap();
        assert!(matches!(action, CartAction::Update { quantity: 0, .. }));

        let err = parse(r#"{"action":"update","cartId":"c1","lineId":"l1"}"#).unwrap_err();
        assert_eq!(err.to_string(), "cartId, lineId, and quantity are required");

        assert_eq!(
            parse(r#"{"action":"update","cartId":"c1","lineId":"l1","quantity":-2}"#),
            Err(InvalidCartRequest::InvalidQuantity)
        );
    }

    #[test]
    fn test_remove_requires_line() {
        let err = parse(r#"{"action":"remove","cartId":"c1"}"#).unwrap_err();
        assert_eq!(err.to_string(), "cartId and lineId are required");
    }

    #[test]
    fn test_unknown_or_missing_action() {
        assert_eq!(parse(r#"{"action":"merge"}"#), Err(InvalidCartRequest::InvalidAction));
        assert_eq!(parse("{}"), Err(InvalidCartRequest::InvalidAction));
        assert_eq!(parse(r#"{"action":"create"}"#), Ok(CartAction::Create));
    }

    #[test]
    fn test_request_constructors_serialize_camel_case() {
        let request = CartActionRequest::update(&CartId::new("c1"), &CartLineId::new("l1"), 3);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "update", "cartId": "c1", "lineId": "l1", "quantity": 3})
        );

        let json = serde_json::to_value(CartActionRequest::create()).unwrap();
        assert_eq!(json, serde_json::json!({"action": "create"}));
    }
}
