//! Cart route handlers.
//!
//! Handlers mutate the in-memory cart session; remote writes go out through
//! the debounced coalescer. Every response carries the full cart view with
//! freshly computed totals.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lepestok_core::{CartItem, OrderId, Price, ProductId};

use crate::cart::{CartPhase, CartSession};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::TelegramAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub total_amount: Price,
    pub order_id: Option<OrderId>,
    pub phase: CartPhase,
}

impl CartView {
    fn from_session(session: &CartSession) -> Self {
        Self {
            items: session.items(),
            total_items: session.total_items(),
            total_amount: session.total_amount(),
            order_id: session.current_order().map(|order| order.id),
            phase: session.phase(),
        }
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Current cart with totals.
#[instrument(skip(state, user), fields(tg_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
) -> Result<Json<ApiResponse<CartView>>> {
    let session = state.cart_session(&user).await;
    Ok(Json(ApiResponse::ok(CartView::from_session(&session))))
}

/// Add a product to the cart (merges into an existing line).
#[instrument(skip(state, user, request), fields(tg_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let quantity = request.quantity.unwrap_or(1).max(1);

    let product = ProductRepository::new(state.pool())
        .get(request.product_id)
        .await?
        .filter(|product| product.is_active)
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let session = state.cart_session(&user).await;
    session.add_to_cart(&product, quantity).await?;

    Ok(Json(ApiResponse::ok(CartView::from_session(&session))))
}

/// Set a line's quantity; zero or below removes it.
#[instrument(skip(state, user), fields(tg_id = %user.id, product_id = %product_id))]
pub async fn update(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let session = state.cart_session(&user).await;
    session.update_quantity(product_id, request.quantity)?;

    Ok(Json(ApiResponse::ok(CartView::from_session(&session))))
}

/// Remove a line from the cart.
#[instrument(skip(state, user), fields(tg_id = %user.id, product_id = %product_id))]
pub async fn remove(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ApiResponse<CartView>>> {
    let session = state.cart_session(&user).await;
    session.update_quantity(product_id, 0)?;

    Ok(Json(ApiResponse::ok(CartView::from_session(&session))))
}

/// Abandon the cart: reset local state and drop unflushed writes.
#[instrument(skip(state, user), fields(tg_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
) -> Result<Json<ApiResponse<CartView>>> {
    let session = state.cart_session(&user).await;
    session.clear();

    Ok(Json(ApiResponse::ok(CartView::from_session(&session))))
}
