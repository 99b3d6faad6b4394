//! HTTP route handlers for the Mini App API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Catalog
//! GET  /api/products                - Active products, newest first
//!
//! # Profile
//! GET  /api/me                      - Current identity + admin flag
//!
//! # Cart
//! GET    /api/cart                  - Current cart with totals
//! DELETE /api/cart                  - Abandon the cart
//! POST   /api/cart/items            - Add a product (merges quantities)
//! PUT    /api/cart/items/{id}       - Set a line's quantity (0 removes)
//! DELETE /api/cart/items/{id}       - Remove a line
//!
//! # Checkout
//! POST /api/checkout                - Confirm the editing order
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod profile;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// The `{success, data, error}` envelope every API response uses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying data.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed response carrying an error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create all routes for the storefront API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(catalog::index))
        .route("/api/me", get(profile::me))
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(checkout::confirm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let response = ApiResponse::ok(7);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 7);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = ApiResponse::<()>::error("nope");
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "nope");
        assert!(json.get("data").is_none());
    }
}
