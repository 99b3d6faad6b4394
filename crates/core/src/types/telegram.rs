//! Telegram identity and init-data verification.
//!
//! The Mini App runs inside the Telegram client, which hands the web view an
//! `initData` query string carrying the user profile and an HMAC-SHA256
//! signature over the payload. This module parses the user out of that
//! string and verifies the signature against the bot token.
//!
//! Parsing and verification are pure computation; transporting the string
//! (an HTTP header) is the caller's concern.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::id::TelegramId;

type HmacSha256 = Hmac<Sha256>;

/// Key used to derive the init-data secret from the bot token.
const WEBAPP_SECRET_KEY: &[u8] = b"WebAppData";

/// The Telegram user profile supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    /// Stable numeric user identifier.
    pub id: TelegramId,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl TelegramUser {
    /// Full display name ("First Last" or just "First").
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

/// Errors from init-data parsing or signature verification.
#[derive(Debug, Error)]
pub enum InitDataError {
    /// A `key=value` pair could not be split or decoded.
    #[error("malformed init data: {0}")]
    Malformed(String),

    /// A required field is absent from the query string.
    #[error("init data is missing the '{0}' field")]
    MissingField(&'static str),

    /// The `user` field did not deserialize into a Telegram user.
    #[error("invalid user payload: {0}")]
    InvalidUser(#[from] serde_json::Error),

    /// The HMAC signature did not match the payload.
    #[error("init data signature mismatch")]
    SignatureMismatch,
}

/// Init-data parsing and verification.
pub mod init_data {
    use super::{
        HmacSha256, InitDataError, Mac, TelegramUser, WEBAPP_SECRET_KEY,
    };

    /// Extract the Telegram user from a raw init-data query string.
    ///
    /// Does NOT verify the signature; call [`verify`] first when a bot token
    /// is available.
    ///
    /// # Errors
    ///
    /// Returns [`InitDataError`] if the string is malformed, the `user`
    /// field is absent, or its JSON payload is invalid.
    pub fn parse_user(raw: &str) -> Result<TelegramUser, InitDataError> {
        for (key, value) in pairs(raw)? {
            if key == "user" {
                let user: TelegramUser = serde_json::from_str(&value)?;
                return Ok(user);
            }
        }
        Err(InitDataError::MissingField("user"))
    }

    /// Verify the init-data signature against the bot token.
    ///
    /// Implements the documented scheme: the data-check string is every
    /// decoded `key=value` pair except `hash`, sorted by key and joined with
    /// newlines; the secret is `HMAC_SHA256("WebAppData", bot_token)`; the
    /// signature is the hex HMAC of the data-check string under that secret.
    ///
    /// # Errors
    ///
    /// Returns [`InitDataError::SignatureMismatch`] on any signature
    /// discrepancy, or a parse error if the string is malformed.
    pub fn verify(raw: &str, bot_token: &str) -> Result<(), InitDataError> {
        let mut hash = None;
        let mut check_pairs = Vec::new();

        for (key, value) in pairs(raw)? {
            if key == "hash" {
                hash = Some(value);
            } else {
                check_pairs.push(format!("{key}={value}"));
            }
        }

        let hash = hash.ok_or(InitDataError::MissingField("hash"))?;
        let expected = hex::decode(&hash).map_err(|_| InitDataError::SignatureMismatch)?;

        check_pairs.sort();
        let data_check = check_pairs.join("\n");

        let secret = hmac_sha256(WEBAPP_SECRET_KEY, bot_token.as_bytes())?;
        let mut mac = HmacSha256::new_from_slice(&secret)
            .map_err(|e| InitDataError::Malformed(e.to_string()))?;
        mac.update(data_check.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| InitDataError::SignatureMismatch)
    }

    /// Split a query string into decoded `(key, value)` pairs.
    fn pairs(raw: &str) -> Result<Vec<(String, String)>, InitDataError> {
        raw.split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| InitDataError::Malformed(format!("pair without '=': {pair}")))?;
                let value = urlencoding::decode(value)
                    .map_err(|e| InitDataError::Malformed(e.to_string()))?;
                Ok((key.to_owned(), value.into_owned()))
            })
            .collect()
    }

    fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, InitDataError> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| InitDataError::Malformed(e.to_string()))?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    #[cfg(test)]
    pub(crate) fn sign_for_tests(raw_without_hash: &str, bot_token: &str) -> String {
        let decoded: Vec<String> = pairs(raw_without_hash)
            .expect("valid pairs")
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let mut sorted = decoded;
        sorted.sort();
        let data_check = sorted.join("\n");

        let secret = hmac_sha256(WEBAPP_SECRET_KEY, bot_token.as_bytes()).expect("hmac");
        let mut mac = HmacSha256::new_from_slice(&secret).expect("hmac key");
        mac.update(data_check.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_JSON: &str = r#"{"id":42,"first_name":"Anna","last_name":"Petrova","username":"annap"}"#;

    fn raw_init_data() -> String {
        format!(
            "auth_date=1710000000&query_id=AAF1abc&user={}",
            urlencoding::encode(USER_JSON)
        )
    }

    #[test]
    fn test_parse_user_from_encoded_payload() {
        let user = init_data::parse_user(&raw_init_data()).expect("user parses");
        assert_eq!(user.id, TelegramId::new(42));
        assert_eq!(user.first_name, "Anna");
        assert_eq!(user.username.as_deref(), Some("annap"));
        assert_eq!(user.display_name(), "Anna Petrova");
    }

    #[test]
    fn test_parse_user_missing_field() {
        let err = init_data::parse_user("auth_date=1710000000").unwrap_err();
        assert!(matches!(err, InitDataError::MissingField("user")));
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let raw = raw_init_data();
        let token = "12345:test-bot-token";
        let hash = init_data::sign_for_tests(&raw, token);
        let signed = format!("{raw}&hash={hash}");

        init_data::verify(&signed, token).expect("signature is valid");
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let raw = raw_init_data();
        let token = "12345:test-bot-token";
        let hash = init_data::sign_for_tests(&raw, token);
        let tampered = format!("auth_date=1710000001&query_id=AAF1abc&user={}&hash={hash}",
            urlencoding::encode(USER_JSON));

        let err = init_data::verify(&tampered, token).unwrap_err();
        assert!(matches!(err, InitDataError::SignatureMismatch));
    }

    #[test]
    fn test_verify_rejects_wrong_token() {
        let raw = raw_init_data();
        let hash = init_data::sign_for_tests(&raw, "12345:test-bot-token");
        let signed = format!("{raw}&hash={hash}");

        let err = init_data::verify(&signed, "99999:other-token").unwrap_err();
        assert!(matches!(err, InitDataError::SignatureMismatch));
    }

    #[test]
    fn test_verify_missing_hash() {
        let err = init_data::verify(&raw_init_data(), "token").unwrap_err();
        assert!(matches!(err, InitDataError::MissingField("hash")));
    }

    #[test]
    fn test_display_name_without_last_name() {
        let user = TelegramUser {
            id: TelegramId::new(1),
            first_name: "Ivan".to_owned(),
            last_name: None,
            username: None,
        };
        assert_eq!(user.display_name(), "Ivan");
    }
}
