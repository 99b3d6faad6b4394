//! Order views for operator reconciliation.
//!
//! A failed order notification leaves the store showing `confirmed` while
//! the buyer saw an error; this listing is where an operator spots and
//! resolves that divergence.

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use lepestok_core::{Order, OrderStatus, Price};

use super::RepositoryError;

/// An order row with its computed line total.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    /// Sum of quantity × unit price across the order's lines.
    pub items_total: Price,
}

/// Repository for order read operations.
pub struct OrderAdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderAdminRepository<'a> {
    /// Create a new repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` on an unknown stored status.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT o.id, o.user_tg_id, o.status, o.total_amount,
                   o.customer_name, o.phone_number, o.delivery_type,
                   o.delivery_address, o.delivery_cost, o.photo_send_to,
                   o.payment_method, o.delivery_date, o.delivery_time,
                   o.created_at,
                   COALESCE(SUM(oi.quantity * oi.unit_price), 0) AS items_total
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE $1::text IS NULL OR o.status = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC
            ",
        )
        .bind(status.map(|s| s.as_str().to_owned()))
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }
}

fn summary_from_row(row: &PgRow) -> Result<OrderSummary, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(RepositoryError::DataCorruption)?;

    Ok(OrderSummary {
        order: Order {
            id: row.try_get("id")?,
            user_tg_id: row.try_get("user_tg_id")?,
            status,
            total_amount: row.try_get("total_amount")?,
            customer_name: row.try_get("customer_name")?,
            phone_number: row.try_get("phone_number")?,
            delivery_type: row.try_get("delivery_type")?,
            delivery_address: row.try_get("delivery_address")?,
            delivery_cost: row.try_get("delivery_cost")?,
            photo_send_to: row.try_get("photo_send_to")?,
            payment_method: row.try_get("payment_method")?,
            delivery_date: row.try_get("delivery_date")?,
            delivery_time: row.try_get("delivery_time")?,
            created_at: row.try_get("created_at")?,
        },
        items_total: row.try_get("items_total")?,
    })
}
