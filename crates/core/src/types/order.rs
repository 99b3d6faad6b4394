//! Order, order item, and checkout detail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};
use super::money::Price;
use super::status::OrderStatus;

/// An order row in the remote store.
///
/// Invariant: at most one order with `status = editing` exists per owning
/// identity. Detail fields stay `None` until checkout patches them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Owning identity: the Telegram user id in string form.
    pub user_tg_id: String,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub delivery_type: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_cost: Option<Price>,
    pub photo_send_to: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<String>,
    pub delivery_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order is still being edited.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.status == OrderStatus::Editing
    }
}

/// An order line as stored remotely.
///
/// Unique on `(order_id, product_id)`; a quantity at or below zero means the
/// row is deleted rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price captured at write time.
    pub unit_price: Price,
}

/// Delivery and payment details collected by the checkout form.
///
/// Patched onto the order row during confirmation; also echoed into the
/// order-processing notification payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub customer_name: String,
    pub phone_number: String,
    pub delivery_type: String,
    pub delivery_address: Option<String>,
    pub delivery_cost: Price,
    pub photo_send_to: String,
    pub payment_method: String,
    pub delivery_date: Option<String>,
    pub delivery_time: Option<String>,
}
