//! Order confirmation pipeline.
//!
//! Turns a confirmed cart into a durable order: a status transition in the
//! remote store, a detail patch, and a single outbound notification to the
//! order-processing endpoint.
//!
//! Stages run strictly in order and none is retried automatically:
//!
//! ```text
//! Idle → Submitting (status + details) → Notifying (webhook) → Done
//!                                                            ↘ Failed
//! ```
//!
//! The status transition happens *before* the notification, so the store
//! reflects confirmation even when the webhook fails. Steps already applied
//! are not rolled back on a later failure: the order then stays `confirmed`
//! in the store while the caller sees the error, and an operator reconciles
//! through the admin panel. The local cart is cleared only after the
//! notification succeeds.

pub mod delivery;
mod payload;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

pub use payload::{OrderPayload, PayloadItem, PayloadUser};

use lepestok_core::{OrderDetails, OrderId, OrderStatus, UserPatch};

use crate::cart::{CartError, CartSession};
use crate::db::{OrderStore, RepositoryError};
use crate::services::{NotifyError, OrderNotifier};

/// Pipeline stage, recorded on tracing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Idle,
    Submitting,
    Notifying,
    Done,
    Failed,
}

impl CheckoutStage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Errors from the confirmation pipeline.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Confirm was called with no editing order; no remote call was made.
    #[error("no active order")]
    NoActiveOrder,

    /// A confirmation is already running for this session.
    #[error("confirmation already in progress")]
    AlreadyConfirming,

    /// The store rejected the status transition or detail patch.
    #[error("order store error during confirmation: {0}")]
    Store(#[from] RepositoryError),

    /// The order-processing endpoint rejected or missed the notification.
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl From<CartError> for CheckoutError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::NoActiveOrder | CartError::AuthRequired => Self::NoActiveOrder,
            CartError::ConfirmationInProgress => Self::AlreadyConfirming,
            CartError::Store(inner) => Self::Store(inner),
        }
    }
}

/// A successfully confirmed order.
#[derive(Debug, Clone)]
pub struct ConfirmedOrder {
    pub order_id: OrderId,
    /// Correlation id returned by the order-processing service, if any.
    pub salebot_client_id: Option<String>,
}

/// The confirmation pipeline, constructed once per process and shared.
pub struct CheckoutPipeline {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn OrderNotifier>,
}

impl CheckoutPipeline {
    /// Create a pipeline over the given store and notifier.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Confirm the session's editing order.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NoActiveOrder`] with no editing order (zero remote
    ///   calls are made);
    /// - [`CheckoutError::AlreadyConfirming`] on a repeat confirm;
    /// - [`CheckoutError::Store`] if the status transition or detail patch
    ///   fails (nothing is rolled back);
    /// - [`CheckoutError::Notify`] if the webhook times out or rejects the
    ///   order - the order REMAINS `confirmed` in the store and the local
    ///   cart is kept for a retry.
    #[instrument(skip(self, session, details))]
    pub async fn confirm(
        &self,
        session: &CartSession,
        details: OrderDetails,
    ) -> Result<ConfirmedOrder, CheckoutError> {
        // Entering `Confirming` drops pending coalescer entries: the order
        // is logically closed from here on.
        let (order, items, identity) = session.begin_confirmation()?;

        info!(
            order_id = %order.id,
            stage = CheckoutStage::Submitting.as_str(),
            items = items.len(),
            "confirming order"
        );

        // 1. Status first: the store must reflect confirmation even if the
        //    notification below never lands.
        if let Err(e) = self
            .store
            .update_order_status(order.id, OrderStatus::Confirmed)
            .await
        {
            session.fail_confirmation();
            return Err(e.into());
        }

        // 2. Patch in the finalized delivery/payment details.
        if let Err(e) = self.store.update_order_details(order.id, &details).await {
            session.fail_confirmation();
            return Err(e.into());
        }

        // 3. Refresh the stored profile and pick up any existing salebot
        //    correlation id for the payload. Best-effort.
        let stored_user = match self
            .store
            .upsert_user(&UserPatch::from_telegram(&identity))
            .await
        {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "profile upsert failed; notifying with identity fields only");
                None
            }
        };

        let payload =
            OrderPayload::build(&order, &items, &details, &identity, stored_user.as_ref());

        info!(
            order_id = %order.id,
            stage = CheckoutStage::Notifying.as_str(),
            total = %payload.total_amount,
            "notifying order processing"
        );

        // 4. The single outbound notification. On failure the order stays
        //    `confirmed` in the store and the local cart is kept intact.
        let response = match self.notifier.notify(&payload).await {
            Ok(response) => response,
            Err(e) => {
                session.fail_confirmation();
                warn!(
                    order_id = %order.id,
                    stage = CheckoutStage::Failed.as_str(),
                    error = %e,
                    "order notification failed; order remains confirmed in store"
                );
                return Err(e.into());
            }
        };

        // 5. Persist the returned correlation id. Best-effort: its failure
        //    must not fail the confirmation.
        if let Some(client_id) = &response.salebot_client_id {
            if let Err(e) = self
                .store
                .upsert_user(&UserPatch::salebot_client_id(identity.id, client_id.clone()))
                .await
            {
                warn!(error = %e, "failed to persist salebot client id");
            }
        }

        // 6. Only now does the local cart clear and the caller learn of
        //    success.
        session.complete_confirmation();
        info!(
            order_id = %order.id,
            stage = CheckoutStage::Done.as_str(),
            "order confirmed"
        );

        Ok(ConfirmedOrder {
            order_id: order.id,
            salebot_client_id: response.salebot_client_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_mapping() {
        assert!(matches!(
            CheckoutError::from(CartError::NoActiveOrder),
            CheckoutError::NoActiveOrder
        ));
        assert!(matches!(
            CheckoutError::from(CartError::ConfirmationInProgress),
            CheckoutError::AlreadyConfirming
        ));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(CheckoutStage::Submitting.as_str(), "submitting");
        assert_eq!(CheckoutStage::Done.as_str(), "done");
    }
}
