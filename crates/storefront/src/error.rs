//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers should return
//! `Result<T, AppError>`; responses use the `{success, error}` JSON envelope
//! the Mini App consumes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::checkout::delivery::ValidationError;
use crate::db::RepositoryError;
use crate::routes::ApiResponse;
use crate::services::NotifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order confirmation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Checkout form rules rejected the details.
    #[error("Invalid order details: {0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request could not be authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is a server-side fault worth a Sentry event.
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Cart(CartError::Store(_))
                | Self::Checkout(CheckoutError::Store(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(err) => match err {
                CartError::AuthRequired => StatusCode::UNAUTHORIZED,
                CartError::NoActiveOrder | CartError::ConfirmationInProgress => {
                    StatusCode::CONFLICT
                }
                CartError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::NoActiveOrder | CheckoutError::AlreadyConfirming => {
                    StatusCode::CONFLICT
                }
                CheckoutError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                // The distinct timeout condition maps to the gateway-timeout
                // family; upstream rejections surface as a bad gateway.
                CheckoutError::Notify(NotifyError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                CheckoutError::Notify(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message; internal details stay in the logs.
    fn message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Cart(err) => match err {
                CartError::Store(_) => "Internal server error".to_owned(),
                other => other.to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::Store(_) => "Internal server error".to_owned(),
                CheckoutError::Notify(NotifyError::Timeout) => "Request timeout".to_owned(),
                CheckoutError::Notify(NotifyError::Upstream { status, .. }) => {
                    format!("External API error: {status}")
                }
                CheckoutError::Notify(NotifyError::Http(_)) => {
                    "Failed to process order".to_owned()
                }
                other => other.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let body = ApiResponse::<()>::error(self.message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_owned());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_cart_error_status_codes() {
        assert_eq!(
            get_status(AppError::Cart(CartError::AuthRequired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::NoActiveOrder)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_notify_error_status_codes() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::Notify(
                NotifyError::Timeout
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::Notify(
                NotifyError::Upstream {
                    status: 500,
                    body: "oops".to_owned()
                }
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret".to_owned()));
        assert_eq!(err.message(), "Internal server error");

        let err = AppError::Checkout(CheckoutError::Notify(NotifyError::Upstream {
            status: 503,
            body: "stack trace".to_owned(),
        }));
        assert_eq!(err.message(), "External API error: 503");
    }
}
