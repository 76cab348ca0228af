//! [`CartRemote`] that talks to a storefront's `POST /api/cart` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::instrument;
use verger_core::{Cart, CartId, CartLineId, MerchandiseId};

use super::protocol::{
    CODE_CART_NOT_FOUND, CODE_UPSTREAM_ERROR, CODE_USER_ERROR, CartRemote, SyncError,
    indicates_expired_cart,
};
use super::wire::{CartActionRequest, CartResponse, ErrorResponse};

/// Cart remote backed by the local cart mutation endpoint.
#[derive(Debug, Clone)]
pub struct HttpCartRemote {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCartRemote {
    /// Create a remote posting to `endpoint` (e.g. `http://127.0.0.1:3000/api/cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self, request), fields(action = %request.action))]
    async fn send(&self, request: CartActionRequest) -> Result<Cart, SyncError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        if status.is_success() {
            let parsed: CartResponse = serde_json::from_str(&body).map_err(|e| {
                tracing::warn!(error = %e, "Cart endpoint returned an unreadable cart");
                SyncError::Transport(format!("invalid cart response: {e}"))
            })?;
            return Ok(parsed.cart);
        }

        let error = classify_failure(status, &body);
        tracing::debug!(status = %status, code = error.code(), "Cart endpoint rejected request");
        Err(error)
    }
}

/// Classify a non-success answer of the cart endpoint.
///
/// The `code` field decides when present; otherwise the message is matched
/// for expiry and the status separates bad requests from server failures.
fn classify_failure(status: StatusCode, body: &str) -> SyncError {
    let Ok(ErrorResponse { error, code }) = serde_json::from_str::<ErrorResponse>(body) else {
        return SyncError::Transport(format!(
            "HTTP {status}: {}",
            body.chars().take(200).collect::<String>()
        ));
    };

    match code.as_deref() {
        Some(CODE_CART_NOT_FOUND) => SyncError::ExpiredCart(error),
        Some(CODE_USER_ERROR) => SyncError::Validation(error),
        Some(CODE_UPSTREAM_ERROR) => SyncError::Transport(error),
        code if indicates_expired_cart(code, &error) => SyncError::ExpiredCart(error),
        _ if status.is_client_error() => SyncError::Validation(error),
        _ => SyncError::Transport(error),
    }
}

#[async_trait]
impl CartRemote for HttpCartRemote {
    async fn create_cart(&self) -> Result<Cart, SyncError> {
        self.send(CartActionRequest::create()).await
    }

    async fn add_line(
        &self,
        cart_id: &CartId,
        merchandise_id: &MerchandiseId,
        quantity: u32,
    ) -> Result<Cart, SyncError> {
        self.send(CartActionRequest::add(cart_id, merchandise_id, quantity))
            .await
    }

    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
        quantity: u32,
    ) -> Result<Cart, SyncError> {
        self.send(CartActionRequest::update(cart_id, line_id, quantity))
            .await
    }

    async fn remove_line(
        &self,
        cart_id: &CartId,
        line_id: &CartLineId,
    ) -> Result<Cart, SyncError> {
        self.send(CartActionRequest::remove(cart_id, line_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_wins_over_message() {
        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Cart is gone","code":"CART_NOT_FOUND"}"#,
        );
        assert_eq!(err, SyncError::ExpiredCart("Cart is gone".to_string()));

        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Variant does not exist","code":"USER_ERROR"}"#,
        );
        assert_eq!(err, SyncError::Validation("Variant does not exist".to_string()));
    }

    #[test]
    fn test_message_fallback_without_code() {
        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"The specified cart does not exist."}"#,
        );
        assert!(err.is_expired_cart());

        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Something broke"}"#,
        );
        assert_eq!(err, SyncError::Transport("Something broke".to_string()));
    }

    #[test]
    fn test_bad_request_is_validation() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error":"cartId and variantId are required","code":"INVALID_REQUEST"}"#,
        );
        assert_eq!(
            err,
            SyncError::Validation("cartId and variantId are required".to_string())
        );
    }

    #[test]
    fn test_unreadable_body_is_transport() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.code(), CODE_UPSTREAM_ERROR);
    }
}
