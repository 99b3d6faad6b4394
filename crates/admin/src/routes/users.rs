//! User listing handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use lepestok_core::User;

use crate::db::UserAdminRepository;
use crate::error::Result;
use crate::middleware::AdminAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// List shop users, most recently seen first.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    AdminAuth(_admin): AdminAuth,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let users = UserAdminRepository::new(state.pool()).list().await?;
    Ok(Json(ApiResponse::ok(users)))
}
