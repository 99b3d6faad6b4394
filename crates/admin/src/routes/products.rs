//! Product management handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use lepestok_core::{Price, Product, ProductId};

use crate::db::ProductAdminRepository;
use crate::db::products::ProductForm;
use crate::error::{AppError, Result};
use crate::middleware::AdminAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Product create/update request body (row-shaped, like the table).
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub composition: Option<String>,
    pub description: Option<String>,
    pub price: Price,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl ProductRequest {
    fn into_form(self) -> Result<ProductForm> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("product name is required".to_owned()));
        }
        if self.price.is_negative() {
            return Err(AppError::BadRequest(
                "product price must be non-negative".to_owned(),
            ));
        }

        Ok(ProductForm {
            name: self.name,
            composition: self.composition,
            description: self.description,
            price: self.price,
            photo_url: self.photo_url,
            stock: self.stock,
            is_active: self.is_active,
        })
    }
}

/// List all products, active and inactive.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    AdminAuth(_admin): AdminAuth,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductAdminRepository::new(state.pool()).list_all().await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// Create a product.
#[instrument(skip(state, admin, request), fields(admin = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ApiResponse<Product>>> {
    let form = request.into_form()?;
    let product = ProductAdminRepository::new(state.pool()).create(&form).await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok(Json(ApiResponse::ok(product)))
}

/// Replace a product's fields.
#[instrument(skip(state, admin, request), fields(admin = %admin.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(id): Path<ProductId>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ApiResponse<Product>>> {
    let form = request.into_form()?;
    let product = ProductAdminRepository::new(state.pool())
        .update(id, &form)
        .await?;

    Ok(Json(ApiResponse::ok(product)))
}

/// Delete a product.
#[instrument(skip(state, admin), fields(admin = %admin.id, product_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<()>>> {
    ProductAdminRepository::new(state.pool()).delete(id).await?;

    tracing::info!(product_id = %id, "product deleted");
    Ok(Json(ApiResponse::ok(())))
}
