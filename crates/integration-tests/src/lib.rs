//! Test support for Lepestok integration tests.
//!
//! Provides in-memory mock implementations of the two external seams the
//! cart/checkout core talks to - the order store and the order-processing
//! notifier - plus shared fixtures. The mocks journal every call so tests
//! can assert not just on end state but on exactly which remote operations
//! were issued.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use lepestok_core::{
    CartItem, Order, OrderDetails, OrderId, OrderStatus, Price, Product, ProductId, TelegramId,
    TelegramUser, User, UserPatch,
};
use lepestok_storefront::checkout::OrderPayload;
use lepestok_storefront::db::{OrderStore, RepositoryError};
use lepestok_storefront::services::{NotifyError, NotifyResponse, OrderNotifier};

// =============================================================================
// Fixtures
// =============================================================================

/// A catalog product fixture.
#[must_use]
pub fn product(name: &str, rubles: i64) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        composition: None,
        description: None,
        price: Price::from_rubles(rubles),
        photo_url: None,
        stock: 25,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A Telegram identity fixture.
#[must_use]
pub fn telegram_user(id: i64) -> TelegramUser {
    TelegramUser {
        id: TelegramId::new(id),
        first_name: "Анна".to_owned(),
        last_name: Some("Петрова".to_owned()),
        username: Some("annap".to_owned()),
    }
}

/// Valid checkout details for a courier delivery zone.
#[must_use]
pub fn order_details() -> OrderDetails {
    OrderDetails {
        customer_name: "Анна Петрова".to_owned(),
        phone_number: "+79123456789".to_owned(),
        delivery_type: "Центр".to_owned(),
        delivery_address: Some("ул. Ленина, 1".to_owned()),
        delivery_cost: Price::from_rubles(250),
        photo_send_to: "telegram".to_owned(),
        payment_method: "card".to_owned(),
        delivery_date: Some("2026-03-08".to_owned()),
        delivery_time: Some("12:00-13:00".to_owned()),
    }
}

// =============================================================================
// MockOrderStore
// =============================================================================

/// A remote call observed by the mock store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    GetEditingOrder(TelegramId),
    CreateOrder(TelegramId),
    UpdateOrderStatus(OrderId, OrderStatus),
    UpdateOrderDetails(OrderId),
    GetOrderItems(OrderId),
    UpsertOrderItem {
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    },
    UpsertUser(TelegramId),
}

#[derive(Default)]
struct MockStoreState {
    orders: Vec<Order>,
    items: HashMap<(OrderId, ProductId), (i32, Price)>,
    products: HashMap<ProductId, Product>,
    users: HashMap<i64, User>,
    calls: Vec<StoreCall>,
    fail_reads: bool,
    fail_item_writes: bool,
    fail_user_writes: bool,
}

/// In-memory order store with a call journal and scripted failures.
#[derive(Default)]
pub struct MockOrderStore {
    state: Mutex<MockStoreState>,
}

impl MockOrderStore {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockStoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a product so item reads can join against it.
    pub fn add_product(&self, product: &Product) {
        self.lock().products.insert(product.id, product.clone());
    }

    /// Seed an editing order, as if a prior session created it.
    pub fn seed_editing_order(&self, owner: TelegramId) -> Order {
        let order = new_order(owner);
        self.lock().orders.push(order.clone());
        order
    }

    /// Seed an order line, as if a prior session flushed it.
    pub fn seed_order_item(&self, order_id: OrderId, product: &Product, quantity: i32) {
        self.add_product(product);
        self.lock()
            .items
            .insert((order_id, product.id), (quantity, product.price));
    }

    /// Make reads fail (load-time errors).
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make order-item writes fail (flush errors).
    pub fn fail_item_writes(&self, fail: bool) {
        self.lock().fail_item_writes = fail;
    }

    /// Make user upserts fail (best-effort paths).
    pub fn fail_user_writes(&self, fail: bool) {
        self.lock().fail_user_writes = fail;
    }

    /// Every call issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Only the item upsert/delete calls.
    #[must_use]
    pub fn item_write_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::UpsertOrderItem { .. }))
            .collect()
    }

    /// Current status of an order.
    #[must_use]
    pub fn order_status(&self, order_id: OrderId) -> Option<OrderStatus> {
        self.lock()
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .map(|order| order.status)
    }

    /// Current stored quantity for a line, if the row exists.
    #[must_use]
    pub fn item_quantity(&self, order_id: OrderId, product_id: ProductId) -> Option<i32> {
        self.lock()
            .items
            .get(&(order_id, product_id))
            .map(|(quantity, _)| *quantity)
    }

    /// Stored user row, if any.
    #[must_use]
    pub fn user(&self, tg_id: TelegramId) -> Option<User> {
        self.lock().users.get(&tg_id.as_i64()).cloned()
    }

    fn injected_failure() -> RepositoryError {
        RepositoryError::DataCorruption("injected failure".to_owned())
    }
}

fn new_order(owner: TelegramId) -> Order {
    Order {
        id: OrderId::generate(),
        user_tg_id: owner.to_string(),
        status: OrderStatus::Editing,
        total_amount: Price::ZERO,
        customer_name: None,
        phone_number: None,
        delivery_type: None,
        delivery_address: None,
        delivery_cost: None,
        photo_send_to: None,
        payment_method: None,
        delivery_date: None,
        delivery_time: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn get_editing_order(
        &self,
        owner: TelegramId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::GetEditingOrder(owner));
        if state.fail_reads {
            return Err(Self::injected_failure());
        }
        Ok(state
            .orders
            .iter()
            .find(|order| order.user_tg_id == owner.to_string() && order.is_editing())
            .cloned())
    }

    async fn create_order(&self, owner: TelegramId) -> Result<Order, RepositoryError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::CreateOrder(owner));
        // The partial unique index: one editing order per owner.
        if state
            .orders
            .iter()
            .any(|order| order.user_tg_id == owner.to_string() && order.is_editing())
        {
            return Err(RepositoryError::Conflict(
                "editing order already exists".to_owned(),
            ));
        }
        let order = new_order(owner);
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state
            .calls
            .push(StoreCall::UpdateOrderStatus(order_id, status));
        match state.orders.iter_mut().find(|order| order.id == order_id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn update_order_details(
        &self,
        order_id: OrderId,
        details: &OrderDetails,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::UpdateOrderDetails(order_id));
        match state.orders.iter_mut().find(|order| order.id == order_id) {
            Some(order) => {
                order.customer_name = Some(details.customer_name.clone());
                order.phone_number = Some(details.phone_number.clone());
                order.delivery_type = Some(details.delivery_type.clone());
                order.delivery_address = details.delivery_address.clone();
                order.delivery_cost = Some(details.delivery_cost);
                order.photo_send_to = Some(details.photo_send_to.clone());
                order.payment_method = Some(details.payment_method.clone());
                order.delivery_date = details.delivery_date.clone();
                order.delivery_time = details.delivery_time.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<CartItem>, RepositoryError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::GetOrderItems(order_id));
        if state.fail_reads {
            return Err(Self::injected_failure());
        }
        let items = state
            .items
            .iter()
            .filter(|((item_order, _), _)| *item_order == order_id)
            .filter_map(|((_, product_id), (quantity, _))| {
                let product = state.products.get(product_id)?.clone();
                Some(CartItem {
                    product,
                    quantity: u32::try_from(*quantity).ok()?,
                })
            })
            .collect();
        Ok(items)
    }

    async fn upsert_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::UpsertOrderItem {
            order_id,
            product_id,
            quantity,
            unit_price,
        });
        if state.fail_item_writes {
            return Err(Self::injected_failure());
        }
        // Delete-on-zero semantics, exactly like the real store.
        if quantity <= 0 {
            state.items.remove(&(order_id, product_id));
        } else {
            state
                .items
                .insert((order_id, product_id), (quantity, unit_price));
        }
        Ok(())
    }

    async fn upsert_user(&self, patch: &UserPatch) -> Result<User, RepositoryError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::UpsertUser(patch.tg_id));
        if state.fail_user_writes {
            return Err(Self::injected_failure());
        }
        let now = Utc::now();
        let user = state
            .users
            .entry(patch.tg_id.as_i64())
            .and_modify(|user| {
                if patch.salebot_client_id.is_some() {
                    user.salebot_client_id = patch.salebot_client_id.clone();
                }
                if patch.username.is_some() {
                    user.username = patch.username.clone();
                }
                if patch.firstname.is_some() {
                    user.firstname = patch.firstname.clone();
                }
                if patch.lastname.is_some() {
                    user.lastname = patch.lastname.clone();
                }
                user.updated_at = now;
            })
            .or_insert_with(|| User {
                tg_id: patch.tg_id,
                salebot_client_id: patch.salebot_client_id.clone(),
                username: patch.username.clone(),
                firstname: patch.firstname.clone(),
                lastname: patch.lastname.clone(),
                created_at: now,
                updated_at: now,
            })
            .clone();
        Ok(user)
    }
}

// =============================================================================
// MockNotifier
// =============================================================================

/// Scripted notifier behavior.
#[derive(Debug, Clone)]
pub enum NotifyMode {
    /// Succeed, optionally returning a correlation id.
    Ok(Option<String>),
    /// Time out.
    Timeout,
    /// Answer with a non-2xx status and body.
    Upstream(u16, String),
    /// Fail at the transport layer.
    Http(String),
}

struct MockNotifierState {
    mode: NotifyMode,
    payloads: Vec<OrderPayload>,
}

/// In-memory order notifier with scripted outcomes.
pub struct MockNotifier {
    state: Mutex<MockNotifierState>,
}

impl MockNotifier {
    /// A notifier that always succeeds without a correlation id.
    #[must_use]
    pub fn succeeding() -> Arc<Self> {
        Self::with_mode(NotifyMode::Ok(None))
    }

    /// A notifier with the given scripted behavior.
    #[must_use]
    pub fn with_mode(mode: NotifyMode) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockNotifierState {
                mode,
                payloads: Vec::new(),
            }),
        })
    }

    /// Change the scripted behavior (e.g., to test a retry after failure).
    pub fn set_mode(&self, mode: NotifyMode) {
        self.lock().mode = mode;
    }

    /// Number of notification attempts observed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().payloads.len()
    }

    /// The most recent payload, if any call was made.
    #[must_use]
    pub fn last_payload(&self) -> Option<OrderPayload> {
        self.lock().payloads.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockNotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OrderNotifier for MockNotifier {
    async fn notify(&self, payload: &OrderPayload) -> Result<NotifyResponse, NotifyError> {
        let mut state = self.lock();
        state.payloads.push(payload.clone());
        match &state.mode {
            NotifyMode::Ok(client_id) => Ok(NotifyResponse {
                salebot_client_id: client_id.clone(),
            }),
            NotifyMode::Timeout => Err(NotifyError::Timeout),
            NotifyMode::Upstream(status, body) => Err(NotifyError::Upstream {
                status: *status,
                body: body.clone(),
            }),
            NotifyMode::Http(message) => Err(NotifyError::Http(message.clone())),
        }
    }
}
