//! Profile route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use lepestok_core::{User, UserPatch};

use crate::db::AdminRepository;
use crate::error::Result;
use crate::middleware::TelegramAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// The current identity as seen by the shop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeView {
    pub user: User,
    pub is_admin: bool,
}

/// Resolve the current identity: upsert the profile and report the admin
/// flag used to gate the admin panel entry point.
#[instrument(skip(state, user), fields(tg_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
) -> Result<Json<ApiResponse<MeView>>> {
    let stored = state
        .store()
        .upsert_user(&UserPatch::from_telegram(&user))
        .await?;

    let is_admin = AdminRepository::new(state.pool()).is_admin(user.id).await?;

    Ok(Json(ApiResponse::ok(MeView {
        user: stored,
        is_admin,
    })))
}
