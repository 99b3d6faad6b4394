//! Telegram identity extractors.
//!
//! The Mini App sends the raw WebApp init-data string in a request header;
//! the extractors parse the Telegram user out of it and verify the HMAC
//! signature when a bot token is configured. Identity is the external
//! capability here - nothing beyond the header is consulted.

use axum::{extract::FromRequestParts, http::request::Parts};

use lepestok_core::{TelegramUser, init_data};
use secrecy::ExposeSecret;

use crate::cart::CartError;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the raw Telegram init-data query string.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Extractor that requires a Telegram identity.
///
/// Rejects with the auth-required condition when the header is absent and
/// with `Unauthorized` when it fails verification.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(TelegramAuth(user): TelegramAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name)
/// }
/// ```
pub struct TelegramAuth(pub TelegramUser);

impl FromRequestParts<AppState> for TelegramAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(INIT_DATA_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Cart(CartError::AuthRequired))?;

        let user = verify_and_parse(raw, state)?;
        Ok(Self(user))
    }
}

fn verify_and_parse(raw: &str, state: &AppState) -> Result<TelegramUser, AppError> {
    // Signature verification needs the bot token; without one (development
    // mode) the payload is trusted as-is.
    if let Some(token) = state.config().telegram_bot_token.as_ref() {
        init_data::verify(raw, token.expose_secret())
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    }

    init_data::parse_user(raw).map_err(|e| AppError::Unauthorized(e.to_string()))
}
