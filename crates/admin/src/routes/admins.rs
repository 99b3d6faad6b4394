//! Admin allow-list handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::AdminListRepository;
use crate::db::admins::AdminEntry;
use crate::error::{AppError, Result};
use crate::middleware::AdminAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Add-admin request body.
#[derive(Debug, Deserialize)]
pub struct AddAdminRequest {
    pub tg_id: String,
}

/// List allow-list entries.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    AdminAuth(_admin): AdminAuth,
) -> Result<Json<ApiResponse<Vec<AdminEntry>>>> {
    let admins = AdminListRepository::new(state.pool()).list().await?;
    Ok(Json(ApiResponse::ok(admins)))
}

/// Add an id to the allow-list.
#[instrument(skip(state, admin, request), fields(admin = %admin.id))]
pub async fn add(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Json(request): Json<AddAdminRequest>,
) -> Result<Json<ApiResponse<AdminEntry>>> {
    let tg_id = request.tg_id.trim();
    if tg_id.is_empty() {
        return Err(AppError::BadRequest("tg_id is required".to_owned()));
    }

    let entry = AdminListRepository::new(state.pool()).add(tg_id).await?;
    tracing::info!(tg_id = %entry.tg_id, "admin added");
    Ok(Json(ApiResponse::ok(entry)))
}

/// Remove an id from the allow-list.
#[instrument(skip(state, admin), fields(admin = %admin.id, tg_id = %tg_id))]
pub async fn remove(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(tg_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    // An admin removing themselves would lock everyone out one by one;
    // refuse the last-entry removal outright.
    let repo = AdminListRepository::new(state.pool());
    let entries = repo.list().await?;
    if entries.len() <= 1 {
        return Err(AppError::BadRequest(
            "cannot remove the last admin".to_owned(),
        ));
    }

    repo.remove(&tg_id).await?;
    tracing::info!(%tg_id, "admin removed");
    Ok(Json(ApiResponse::ok(())))
}
