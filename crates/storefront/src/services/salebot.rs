//! Order-processing webhook client.
//!
//! Confirmed orders are handed off to an external order-processing endpoint
//! with a single JSON POST. The response may carry a `salebot_client_id`
//! correlation id that gets persisted onto the user record.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::checkout::OrderPayload;
use crate::config::WebhookConfig;

/// Longest response-body prefix kept for diagnostics.
const BODY_SNIPPET_LEN: usize = 500;

/// Errors from the order notification call.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The endpoint did not respond within the request timeout.
    #[error("order webhook request timed out")]
    Timeout,

    /// The endpoint answered with a non-2xx status.
    #[error("order webhook returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Any other transport failure.
    #[error("order webhook request failed: {0}")]
    Http(String),
}

/// Successful notification response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyResponse {
    /// Correlation id assigned by the order-processing service.
    pub salebot_client_id: Option<String>,
}

/// Outbound notification seam, mockable in tests.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// POST the payload to the order-processing endpoint.
    async fn notify(&self, payload: &OrderPayload) -> Result<NotifyResponse, NotifyError>;
}

/// Production webhook client.
#[derive(Clone)]
pub struct SalebotClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl SalebotClient {
    /// Create a client with the configured endpoint and request timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client fails to build.
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
        })
    }
}

#[async_trait]
impl OrderNotifier for SalebotClient {
    async fn notify(&self, payload: &OrderPayload) -> Result<NotifyResponse, NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body),
                "order webhook returned non-success status"
            );
            return Err(NotifyError::Upstream {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        // Tolerate 2xx bodies that are not the expected JSON shape; the
        // correlation id is optional anyway.
        match serde_json::from_str::<NotifyResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                tracing::debug!(error = %e, "order webhook response was not JSON; ignoring body");
                Ok(NotifyResponse::default())
            }
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> NotifyError {
    if e.is_timeout() {
        NotifyError::Timeout
    } else {
        NotifyError::Http(e.to_string())
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_display() {
        assert_eq!(
            NotifyError::Timeout.to_string(),
            "order webhook request timed out"
        );
        let err = NotifyError::Upstream {
            status: 503,
            body: "busy".to_owned(),
        };
        assert_eq!(err.to_string(), "order webhook returned 503: busy");
    }

    #[test]
    fn test_response_parses_correlation_id() {
        let parsed: NotifyResponse =
            serde_json::from_str(r#"{"salebot_client_id":"sb-1","extra":true}"#)
                .expect("parses with unknown fields");
        assert_eq!(parsed.salebot_client_id.as_deref(), Some("sb-1"));

        let empty: NotifyResponse = serde_json::from_str("{}").expect("parses empty");
        assert!(empty.salebot_client_id.is_none());
    }
}
