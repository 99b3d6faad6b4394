//! Admin authentication extractor.
//!
//! Admin requests carry the same Telegram init-data header as the
//! storefront; on top of identity, the extractor gates on the admin
//! allow-list.

use axum::{extract::FromRequestParts, http::request::Parts};

use lepestok_core::{TelegramUser, init_data};
use secrecy::ExposeSecret;

use crate::db::AdminListRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the raw Telegram init-data query string.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Extractor that requires an allow-listed admin identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AdminAuth(admin): AdminAuth) -> impl IntoResponse {
///     format!("Hello, {}!", admin.first_name)
/// }
/// ```
pub struct AdminAuth(pub TelegramUser);

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(INIT_DATA_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Telegram init data".to_owned()))?;

        if let Some(token) = state.config().telegram_bot_token.as_ref() {
            init_data::verify(raw, token.expose_secret())
                .map_err(|e| AppError::Unauthorized(e.to_string()))?;
        }

        let user = init_data::parse_user(raw)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let is_admin = AdminListRepository::new(state.pool())
            .is_admin(user.id)
            .await?;
        if !is_admin {
            return Err(AppError::Forbidden(format!(
                "user {} is not an admin",
                user.id
            )));
        }

        Ok(Self(user))
    }
}
