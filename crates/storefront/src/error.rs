//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error response is a JSON [`ErrorResponse`] body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cart::wire::{CODE_INVALID_REQUEST, ErrorResponse, InvalidCartRequest};
use crate::cart::SyncError;
use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A cart mutation failed upstream.
    #[error("{0}")]
    Cart(#[from] SyncError),

    /// A catalog read failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Cart request refused before reaching Shopify.
    #[error("{0}")]
    InvalidCart(#[from] InvalidCartRequest),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            // The cart endpoint reports every upstream failure as a 500
            Self::Cart(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(ShopifyError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Shopify(ShopifyError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidCart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Cart(err) => err.code(),
            Self::Shopify(ShopifyError::NotFound(_)) | Self::NotFound(_) => "NOT_FOUND",
            Self::Shopify(_) => "UPSTREAM_ERROR",
            Self::InvalidCart(_) | Self::BadRequest(_) => CODE_INVALID_REQUEST,
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error means something is broken on our side or upstream.
    const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Cart(SyncError::Transport(_))
                | Self::Shopify(
                    ShopifyError::Http(_)
                        | ShopifyError::Status { .. }
                        | ShopifyError::GraphQL(_)
                        | ShopifyError::Parse(_)
                        | ShopifyError::EmptyResponse(_)
                        | ShopifyError::UserError { .. }
                )
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        // Cart messages stay verbatim so clients can match on them;
        // other internals are not exposed
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(ShopifyError::NotFound(msg)) => msg.clone(),
            Self::Shopify(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code: Some(self.code().to_string()),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "add", Some(&[("cart_id", cart_id.as_str())]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
