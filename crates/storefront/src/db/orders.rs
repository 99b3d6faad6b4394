//! The remote order store boundary.
//!
//! The cart state machine, write coalescer, and confirmation pipeline all
//! talk to the [`OrderStore`] trait instead of the pool, so the store can be
//! injected per session and mocked in tests. [`PgOrderStore`] is the
//! production implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use lepestok_core::{
    CartItem, Order, OrderDetails, OrderId, OrderStatus, Price, ProductId, TelegramId, User,
    UserPatch,
};

use super::RepositoryError;
use super::products::product_from_row;

/// CRUD contract the cart/checkout core consumes.
///
/// Row semantics:
/// - at most one order with `status = editing` exists per owner (enforced by
///   a partial unique index; see `migrations/`);
/// - `upsert_order_item` with a quantity at or below zero deletes the row.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch the single editing-status order for an owner, if any.
    async fn get_editing_order(&self, owner: TelegramId)
    -> Result<Option<Order>, RepositoryError>;

    /// Create a fresh editing order with a zero total.
    ///
    /// Returns `RepositoryError::Conflict` when the owner already has an
    /// editing order (two sessions racing to create one).
    async fn create_order(&self, owner: TelegramId) -> Result<Order, RepositoryError>;

    /// Transition an order's status.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError>;

    /// Patch the delivery/payment detail fields collected at checkout.
    async fn update_order_details(
        &self,
        order_id: OrderId,
        details: &OrderDetails,
    ) -> Result<(), RepositoryError>;

    /// Fetch an order's lines joined with their product snapshots.
    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Upsert one order line; a quantity at or below zero deletes it.
    async fn upsert_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    ) -> Result<(), RepositoryError>;

    /// Upsert a user row by Telegram id, returning the stored row.
    ///
    /// `None` fields in the patch leave existing values untouched.
    async fn upsert_user(&self, patch: &UserPatch) -> Result<User, RepositoryError>;
}

/// `PostgreSQL` implementation of the order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn get_editing_order(
        &self,
        owner: TelegramId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, user_tg_id, status, total_amount, customer_name,
                   phone_number, delivery_type, delivery_address, delivery_cost,
                   photo_send_to, payment_method, delivery_date, delivery_time,
                   created_at
            FROM orders
            WHERE user_tg_id = $1 AND status = 'editing'
            ",
        )
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn create_order(&self, owner: TelegramId) -> Result<Order, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO orders (user_tg_id, status, total_amount)
            VALUES ($1, 'editing', 0)
            RETURNING id, user_tg_id, status, total_amount, customer_name,
                      phone_number, delivery_type, delivery_address, delivery_cost,
                      photo_send_to, payment_method, delivery_date, delivery_time,
                      created_at
            ",
        )
        .bind(owner.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("editing order already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        order_from_row(&row)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_order_details(
        &self,
        order_id: OrderId,
        details: &OrderDetails,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE orders
            SET customer_name = $2,
                phone_number = $3,
                delivery_type = $4,
                delivery_address = $5,
                delivery_cost = $6,
                photo_send_to = $7,
                payment_method = $8,
                delivery_date = $9,
                delivery_time = $10
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .bind(&details.customer_name)
        .bind(&details.phone_number)
        .bind(&details.delivery_type)
        .bind(&details.delivery_address)
        .bind(details.delivery_cost)
        .bind(&details.photo_send_to)
        .bind(&details.payment_method)
        .bind(&details.delivery_date)
        .bind(&details.delivery_time)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT oi.quantity,
                   p.id, p.name, p.composition, p.description, p.price,
                   p.photo_url, p.stock, p.is_active, p.created_at, p.updated_at
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let quantity: i32 = row.try_get("quantity")?;
                let quantity = u32::try_from(quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "non-positive quantity {quantity} on order item"
                    ))
                })?;
                Ok(CartItem {
                    product: product_from_row(row)?,
                    quantity,
                })
            })
            .collect()
    }

    async fn upsert_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    ) -> Result<(), RepositoryError> {
        // Delete-on-zero: a line with no quantity must not exist as a row.
        if quantity <= 0 {
            sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND product_id = $2")
                .bind(order_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?;
            return Ok(());
        }

        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity,
                          unit_price = EXCLUDED.unit_price
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_user(&self, patch: &UserPatch) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO users (tg_id, salebot_client_id, username, firstname, lastname)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tg_id)
            DO UPDATE SET
                salebot_client_id = COALESCE(EXCLUDED.salebot_client_id, users.salebot_client_id),
                username = COALESCE(EXCLUDED.username, users.username),
                firstname = COALESCE(EXCLUDED.firstname, users.firstname),
                lastname = COALESCE(EXCLUDED.lastname, users.lastname),
                updated_at = now()
            RETURNING tg_id, salebot_client_id, username, firstname, lastname,
                      created_at, updated_at
            ",
        )
        .bind(patch.tg_id)
        .bind(&patch.salebot_client_id)
        .bind(&patch.username)
        .bind(&patch.firstname)
        .bind(&patch.lastname)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }
}

/// Map an order row to the domain type.
fn order_from_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(RepositoryError::DataCorruption)?;

    Ok(Order {
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
    })
}

/// Map a user row to the domain type.
fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    Ok(User {
        tg_id: row.try_get("tg_id")?,
        salebot_client_id: row.try_get("salebot_client_id")?,
        username: row.try_get("username")?,
        firstname: row.try_get("firstname")?,
        lastname: row.try_get("lastname")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
