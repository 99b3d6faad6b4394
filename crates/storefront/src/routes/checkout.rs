//! Checkout route handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lepestok_core::{OrderDetails, OrderId};

use crate::checkout::delivery::{self, DeliveryOption};
use crate::error::Result;
use crate::middleware::TelegramAuth;
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Checkout form data collected by the Mini App.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub phone_number: String,
    pub delivery_type: String,
    pub delivery_address: Option<String>,
    pub photo_send_to: String,
    pub payment_method: String,
    pub delivery_date: Option<String>,
    pub delivery_time: Option<String>,
}

impl CheckoutRequest {
    /// Validate the form data and resolve the delivery cost server-side
    /// from the zone table (the client's idea of the cost is not trusted).
    fn into_details(self) -> Result<OrderDetails> {
        let delivery_cost = delivery::find_option(&self.delivery_type)
            .map_or(lepestok_core::Price::ZERO, DeliveryOption::price);

        let details = OrderDetails {
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            delivery_type: self.delivery_type,
            delivery_address: self.delivery_address,
            delivery_cost,
            photo_send_to: self.photo_send_to,
            payment_method: self.payment_method,
            delivery_date: self.delivery_date,
            delivery_time: self.delivery_time,
        };

        delivery::validate(&details)?;
        Ok(details)
    }
}

/// A confirmed order, as reported to the Mini App.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedView {
    pub order_id: OrderId,
    pub salebot_client_id: Option<String>,
}

/// Confirm the editing order and hand it off to order processing.
///
/// The UI disables the submit trigger while this runs; the session itself
/// also rejects repeat confirms for the duration.
#[instrument(skip(state, user, request), fields(tg_id = %user.id))]
pub async fn confirm(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<ApiResponse<ConfirmedView>>> {
    let details = request.into_details()?;

    let session = state.cart_session(&user).await;
    let confirmed = state.pipeline().confirm(&session, details).await?;

    Ok(Json(ApiResponse::ok(ConfirmedView {
        order_id: confirmed.order_id,
        salebot_client_id: confirmed.salebot_client_id,
    })))
}
