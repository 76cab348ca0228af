//! Cart synchronization protocol.
//!
//! The request/response contract between the cart manager and whatever holds
//! the authoritative cart. Every request returns a full [`Cart`] snapshot or
//! a classified [`SyncError`]. Nothing here retries; recovery policy belongs
//! to the manager.

use async_trait::async_trait;
use thiserror::Error;
use verger_core::{Cart, CartId, CartLineId, MerchandiseId};

use crate::shopify::{ShopifyError, StorefrontClient};

/// Endpoint code for an expired or unknown cart.
pub const CODE_CART_NOT_FOUND: &str = "CART_NOT_FOUND";
/// Endpoint code for an operation the remote rejected.
pub const CODE_USER_ERROR: &str = "USER_ERROR";
/// Endpoint code for network, HTTP or decoding failures upstream.
pub const CODE_UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";

/// Structured codes that mean the cart handle is gone.
const EXPIRED_CART_CODES: &[&str] = &[CODE_CART_NOT_FOUND, "CART_DOES_NOT_EXIST", "NOT_FOUND"];

/// Message fragment Shopify uses for unknown carts.
const EXPIRED_CART_MESSAGE: &str = "does not exist";

/// Classified failure of a protocol request.
///
/// The display form is the remote's message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The cart id no longer exists remotely.
    #[error("{0}")]
    ExpiredCart(String),

    /// The remote rejected the operation (bad merchandise id, bad quantity).
    #[error("{0}")]
    Validation(String),

    /// The request never produced an answer that could be classified.
    #[error("{0}")]
    Transport(String),
}

impl SyncError {
    /// Machine-readable code used on the local cart endpoint.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ExpiredCart(_) => CODE_CART_NOT_FOUND,
            Self::Validation(_) => CODE_USER_ERROR,
            Self::Transport(_) => CODE_UPSTREAM_ERROR,
        }
    }

    /// Whether the cart handle must be discarded.
    #[must_use]
    pub const fn is_expired_cart(&self) -> bool {
        matches!(self, Self::ExpiredCart(_))
    }

    /// Classify a rejection carrying an optional structured code.
    #[must_use]
    pub fn rejected(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        if indicates_expired_cart(code, &message) {
            Self::ExpiredCart(message)
        } else {
            Self::Validation(message)
        }
    }
}

/// Whether a remote failure means the cart no longer exists.
///
/// Structured codes win; the message substring is a fallback for remotes
/// that only send prose.
#[must_use]
pub fn indicates_expired_cart(code: Option<&str>, message: &str) -> bool {
    if let Some(code) = code
        && EXPIRED_CART_CODES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(code))
    {
        return true;
    }
    message.to_lowercase().contains(EXPIRED_CART_MESSAGE)
}

impl From<ShopifyError> for SyncError {
    fn from(err: ShopifyError) -> Self {
        match err {
            ShopifyError::UserError { message, code } => Self::rejected(code.as_deref(), message),
            ShopifyError::GraphQL(errors) => {
                let expired = errors
                    .iter()
                    .any(|e| indicates_expired_cart(e.code.as_deref(), &e.message));
                let message = ShopifyError::GraphQL(errors).to_string();
                if expired {
                    Self::ExpiredCart(message)
                } else {
                    Self::Validation(message)
                }
            }
            ShopifyError::NotFound(message) => Self::Validation(message),
            other @ (ShopifyError::Http(_)
            | ShopifyError::Status { .. }
            | ShopifyError::Parse(_)
            | ShopifyError::EmptyResponse(_)
            | ShopifyError::RateLimited(_)) => Self::Transport(other.to_string()),
        }
    }
}

/// Something that owns carts and applies mutations to them.
#[async_trait]
pub trait CartRemote: Send + Sync {
    /// Create a new, empty cart.
    async fn create_cart(&self) -> Result<Cart, SyncError>;

    /// Add `quantity` of a variant to a cart.
    async fn add_line(
        &self,
        cart_id: &CartId,
        merchandise_id: &MerchandiseId,
        quantity: u32,
    ) -> Result<Cart, SyncError>;

    /// Set a line's quantity.
    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<Cart, SyncError>;

    /// Remove a line.
    async fn remove_line(&self, cart_id: &CartId, line_id: &CartLineId)
    -> Result<Cart, SyncError>;
}

#[async_trait]
impl CartRemote for StorefrontClient {
    async fn create_cart(&self) -> Result<Cart, SyncError> {
        Ok(Self::create_cart(self).await?)
    }

    async fn add_line(
        &self,
        cart_id: &CartId,
        merchandise_id: &MerchandiseId,
        quantity: u32,
    ) -> Result<Cart, SyncError> {
        Ok(self.add_to_cart(cart_id, merchandise_id, quantity).await?)
    }

    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<Cart, SyncError> {
        Ok(self.update_cart_line(cart_id, line_id, quantity).await?)
    }

    async fn remove_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
    ) -> Result<Cart, SyncError> {
        Ok(self.remove_cart_line(cart_id, line_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::GraphQLError;

    #[test]
    fn test_structured_codes_mark_expiry() {
        assert!(indicates_expired_cart(Some("CART_NOT_FOUND"), "gone"));
        assert!(indicates_expired_cart(Some("not_found"), "gone"));
        assert!(!indicates_expired_cart(Some("INVALID"), "bad variant"));
    }

    #[test]
    fn test_message_fallback_is_case_insensitive() {
        assert!(indicates_expired_cart(None, "The specified cart does not exist."));
        assert!(indicates_expired_cart(None, "Cart DOES NOT EXIST"));
        assert!(!indicates_expired_cart(None, "Merchandise is sold out"));
    }

    #[test]
    fn test_user_error_classification() {
        let expired: SyncError = ShopifyError::UserError {
            message: "The specified cart does not exist.".to_string(),
            code: Some("INVALID".to_string()),
        }
        .into();
        assert_eq!(
            expired,
            SyncError::ExpiredCart("The specified cart does not exist.".to_string())
        );

        // Unknown variants use the same wording; only a code can tell them apart
        let unknown_variant: SyncError = ShopifyError::UserError {
            message: "The merchandise with id 1 does not exist.".to_string(),
            code: None,
        }
        .into();
        assert!(unknown_variant.is_expired_cart());

        let invalid: SyncError = ShopifyError::UserError {
            message: "Quantity must be positive".to_string(),
            code: Some("INVALID".to_string()),
        }
        .into();
        assert_eq!(invalid.code(), CODE_USER_ERROR);
    }

    #[test]
    fn test_graphql_error_code_marks_expiry() {
        let err: SyncError = ShopifyError::GraphQL(vec![GraphQLError {
            message: "Cart not found".to_string(),
            code: Some("NOT_FOUND".to_string()),
            ..GraphQLError::default()
        }])
        .into();
        assert!(err.is_expired_cart());
        assert_eq!(err.code(), CODE_CART_NOT_FOUND);
    }

    #[test]
    fn test_transport_classification() {
        let err: SyncError = ShopifyError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(err, SyncError::Transport("HTTP 502: bad gateway".to_string()));
        assert_eq!(err.code(), CODE_UPSTREAM_ERROR);
    }

    #[test]
    fn test_display_is_message_verbatim() {
        let err = SyncError::ExpiredCart("The specified cart does not exist.".to_string());
        assert_eq!(err.to_string(), "The specified cart does not exist.");
    }
}
