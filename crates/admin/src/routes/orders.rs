//! Order view handlers (operator reconciliation).

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use lepestok_core::OrderStatus;

use crate::db::OrderAdminRepository;
use crate::db::orders::OrderSummary;
use crate::error::{AppError, Result};
use crate::middleware::AdminAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Order list query parameters.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// Optional status filter (`editing`, `confirmed`, `paid`).
    pub status: Option<String>,
}

/// List orders with computed line totals.
#[instrument(skip(state, _admin, query))]
pub async fn list(
    State(state): State<AppState>,
    AdminAuth(_admin): AdminAuth,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let orders = OrderAdminRepository::new(state.pool()).list(status).await?;
    Ok(Json(ApiResponse::ok(orders)))
}
