//! Catalog route handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::instrument;

use lepestok_core::Product;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Cache key for the active-catalog listing.
const ACTIVE_CATALOG_KEY: &str = "active";

/// List active products, newest first.
///
/// Served through a short-TTL cache; the catalog changes rarely compared to
/// how often the Mini App asks for it.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Product>>>> {
    if let Some(cached) = state.catalog_cache().get(&ACTIVE_CATALOG_KEY).await {
        tracing::debug!("Cache hit for active catalog");
        return Ok(Json(ApiResponse::ok(cached.as_ref().clone())));
    }

    let products = ProductRepository::new(state.pool()).list_active().await?;

    state
        .catalog_cache()
        .insert(ACTIVE_CATALOG_KEY, Arc::new(products.clone()))
        .await;

    Ok(Json(ApiResponse::ok(products)))
}
