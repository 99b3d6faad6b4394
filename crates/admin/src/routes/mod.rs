//! HTTP route handlers for the admin panel API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//!
//! # Products
//! GET    /api/admin/products            - All products (active + inactive)
//! POST   /api/admin/products            - Create a product
//! PUT    /api/admin/products/{id}       - Replace a product's fields
//! DELETE /api/admin/products/{id}       - Delete a product
//!
//! # Users
//! GET  /api/admin/users                 - Shop users, most recent first
//!
//! # Admin allow-list
//! GET    /api/admin/admins              - Allow-list entries
//! POST   /api/admin/admins              - Add an entry
//! DELETE /api/admin/admins/{tg_id}      - Remove an entry
//!
//! # Orders (operator reconciliation)
//! GET  /api/admin/orders?status=...     - Orders with computed line totals
//! ```
//!
//! Every route is gated by the [`AdminAuth`](crate::middleware::AdminAuth)
//! extractor: a Telegram identity that is on the admin allow-list.

pub mod admins;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, put},
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

/// Create all routes for the admin API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/admin/products/{id}",
            put(products::update).delete(products::remove),
        )
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/admins", get(admins::list).post(admins::add))
        .route("/api/admin/admins/{tg_id}", delete(admins::remove))
        .route("/api/admin/orders", get(orders::list))
}
