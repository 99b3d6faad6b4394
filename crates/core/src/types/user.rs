//! Shop user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TelegramId;
use super::telegram::TelegramUser;

/// A shop user row, keyed by Telegram id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub tg_id: TelegramId,
    /// Correlation id assigned by the order-processing service.
    pub salebot_client_id: Option<String>,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial user update, upserted on conflict by `tg_id`.
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    pub tg_id: TelegramId,
    pub salebot_client_id: Option<String>,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

impl UserPatch {
    /// Patch carrying the profile fields of a Telegram identity.
    #[must_use]
    pub fn from_telegram(user: &TelegramUser) -> Self {
        Self {
            tg_id: user.id,
            salebot_client_id: None,
            username: user.username.clone(),
            firstname: Some(user.first_name.clone()),
            lastname: user.last_name.clone(),
        }
    }

    /// Patch that records the order-processing correlation id.
    #[must_use]
    pub fn salebot_client_id(tg_id: TelegramId, client_id: impl Into<String>) -> Self {
        Self {
            tg_id,
            salebot_client_id: Some(client_id.into()),
            username: None,
            firstname: None,
            lastname: None,
        }
    }
}
