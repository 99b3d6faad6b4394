//! Cart state machine.
//!
//! A [`CartSession`] holds the in-memory representation of "the order
//! currently being edited" for one Telegram identity. Local state is the
//! source of truth for display; the remote store is a lagging replica kept
//! in sync one way (local → remote) through the [`sync::SyncQueue`] write
//! coalescer, and the other way (remote → local) only at load time.
//!
//! Phases per session:
//!
//! ```text
//! NoOrder → Editing → Confirming → Confirmed
//!                          ↘ Failed (recoverable: confirm may be retried)
//! ```

pub mod sync;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;

use lepestok_core::{CartItem, Order, Price, Product, ProductId, TelegramUser};

use crate::db::{OrderStore, RepositoryError};
use sync::SyncQueue;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartPhase {
    /// No editing order exists yet.
    NoOrder,
    /// An editing order exists and accepts mutations.
    Editing,
    /// Confirmation is running; mutations and repeat confirms are rejected.
    Confirming,
    /// Confirmation completed; the cart is empty again.
    Confirmed,
    /// Confirmation failed; the cart is intact and confirm may be retried.
    Failed,
}

/// Errors surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Identity not yet established; mutation blocked, non-fatal.
    #[error("authorization via Telegram required")]
    AuthRequired,

    /// Confirm was called with no editing order present.
    #[error("no active order")]
    NoActiveOrder,

    /// A confirmation is already running for this session.
    #[error("confirmation already in progress")]
    ConfirmationInProgress,

    /// The remote store rejected an operation the cart had to wait for.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

struct CartState {
    phase: CartPhase,
    order: Option<Order>,
    items: Vec<CartItem>,
}

/// The editing-order session for one identity.
///
/// All local mutations are synchronous; only their remote side effects are
/// asynchronous. Derived totals are pure folds over the current item list,
/// recomputed on every call (never cached, so they cannot drift).
pub struct CartSession {
    identity: Option<TelegramUser>,
    store: Arc<dyn OrderStore>,
    sync: SyncQueue,
    state: Mutex<CartState>,
}

impl CartSession {
    /// Create a session for an identity (or an anonymous visitor, whose
    /// mutations will be rejected with [`CartError::AuthRequired`]).
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        identity: Option<TelegramUser>,
        sync_debounce: Duration,
    ) -> Self {
        let sync = SyncQueue::new(Arc::clone(&store), sync_debounce);
        Self {
            identity,
            store,
            sync,
            state: Mutex::new(CartState {
                phase: CartPhase::NoOrder,
                order: None,
                items: Vec::new(),
            }),
        }
    }

    /// The session's Telegram identity, if established.
    #[must_use]
    pub fn identity(&self) -> Option<&TelegramUser> {
        self.identity.as_ref()
    }

    /// Hydrate the cart from the remote store.
    ///
    /// Fails soft: read errors are logged and leave an empty cart rather
    /// than blocking the session.
    pub async fn load(&self) {
        let Some(user) = &self.identity else {
            return;
        };

        match self.store.get_editing_order(user.id).await {
            Ok(Some(order)) => {
                let items = match self.store.get_order_items(order.id).await {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!(order_id = %order.id, error = %e,
                            "failed to load order items; presenting empty cart");
                        Vec::new()
                    }
                };
                let mut state = self.lock_state();
                state.order = Some(order);
                state.items = items;
                state.phase = CartPhase::Editing;
            }
            Ok(None) => {
                let mut state = self.lock_state();
                state.order = None;
                state.items.clear();
                state.phase = CartPhase::NoOrder;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load editing order; presenting empty cart");
                let mut state = self.lock_state();
                state.order = None;
                state.items.clear();
                state.phase = CartPhase::NoOrder;
            }
        }
    }

    /// Add a product to the cart, merging into an existing line.
    ///
    /// Creates the editing order on first use. The local cart is updated
    /// before the coalesced remote write goes out (optimistic update).
    ///
    /// # Errors
    ///
    /// - [`CartError::AuthRequired`] without an identity (state untouched);
    /// - [`CartError::ConfirmationInProgress`] while confirming;
    /// - [`CartError::Store`] if the lazy order creation fails.
    pub async fn add_to_cart(&self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let Some(user) = &self.identity else {
            return Err(CartError::AuthRequired);
        };

        let existing_order = {
            let state = self.lock_state();
            if state.phase == CartPhase::Confirming {
                return Err(CartError::ConfirmationInProgress);
            }
            state.order.clone()
        };

        // Lazily create the editing order; this is the one remote call a
        // mutation waits for.
        let order = match existing_order {
            Some(order) => order,
            None => self.ensure_order(user.id).await?,
        };

        let new_quantity = {
            let mut state = self.lock_state();
            if state.phase == CartPhase::Confirming {
                return Err(CartError::ConfirmationInProgress);
            }
            if state.order.is_none() {
                state.order = Some(order.clone());
            }
            state.phase = CartPhase::Editing;

            match state
                .items
                .iter_mut()
                .find(|item| item.product.id == product.id)
            {
                Some(line) => {
                    line.quantity = line.quantity.saturating_add(quantity);
                    line.quantity
                }
                None => {
                    state.items.push(CartItem {
                        product: product.clone(),
                        quantity,
                    });
                    quantity
                }
            }
        };

        self.sync.enqueue(
            order.id,
            product.id,
            i32::try_from(new_quantity).unwrap_or(i32::MAX),
            product.price,
        );
        Ok(())
    }

    /// Set a line's quantity; at or below zero removes the line.
    ///
    /// Purely local plus an enqueued coalesced write - never blocks on the
    /// network. The resulting quantity is always enqueued (zero signals
    /// deletion to the store).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ConfirmationInProgress`] while confirming.
    pub fn update_quantity(&self, product_id: ProductId, quantity: i32) -> Result<(), CartError> {
        let (order_id, unit_price) = {
            let mut state = self.lock_state();
            if state.phase == CartPhase::Confirming {
                return Err(CartError::ConfirmationInProgress);
            }

            let order_id = state.order.as_ref().map(|order| order.id);
            let position = state
                .items
                .iter()
                .position(|item| item.product.id == product_id);

            let unit_price = match position {
                Some(index) => {
                    if quantity <= 0 {
                        let removed = state.items.remove(index);
                        Some(removed.product.price)
                    } else {
                        state.items.get_mut(index).map(|line| {
                            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                            line.product.price
                        })
                    }
                }
                None => None,
            };
            (order_id, unit_price)
        };

        // Without an order or a known line there is nothing to sync; the
        // flush would have nothing to write anyway.
        if let (Some(order_id), Some(unit_price)) = (order_id, unit_price) {
            self.sync.enqueue(order_id, product_id, quantity, unit_price);
        }
        Ok(())
    }

    /// Reset to `NoOrder`, dropping unflushed coalescer entries.
    ///
    /// Writes already dispatched are not undone.
    pub fn clear(&self) {
        self.sync.clear();
        let mut state = self.lock_state();
        state.phase = CartPhase::NoOrder;
        state.order = None;
        state.items.clear();
    }

    /// Total number of items across all lines. Recomputed per call.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lock_state()
            .items
            .iter()
            .map(|item| item.quantity)
            .sum()
    }

    /// Total cart amount (sum of price × quantity). Recomputed per call.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.lock_state()
            .items
            .iter()
            .map(CartItem::line_total)
            .sum()
    }

    /// Snapshot of the current cart lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock_state().items.clone()
    }

    /// The order currently being edited, if any.
    #[must_use]
    pub fn current_order(&self) -> Option<Order> {
        self.lock_state().order.clone()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> CartPhase {
        self.lock_state().phase
    }

    /// Unflushed coalescer entries (diagnostics and tests).
    #[must_use]
    pub fn pending_sync_writes(&self) -> usize {
        self.sync.pending_len()
    }

    // =========================================================================
    // Confirmation handshake (driven by the checkout pipeline)
    // =========================================================================

    /// Enter the `Confirming` phase and snapshot the order for the pipeline.
    ///
    /// Drops pending coalescer entries: the order is logically closed the
    /// moment confirmation begins. No remote call is made here.
    ///
    /// # Errors
    ///
    /// - [`CartError::NoActiveOrder`] if there is no editing order (also
    ///   covers the identity-less case, where no order can exist);
    /// - [`CartError::ConfirmationInProgress`] on repeat confirm.
    pub fn begin_confirmation(
        &self,
    ) -> Result<(Order, Vec<CartItem>, TelegramUser), CartError> {
        let user = self.identity.clone().ok_or(CartError::NoActiveOrder)?;

        let (order, items) = {
            let mut state = self.lock_state();
            if state.phase == CartPhase::Confirming {
                return Err(CartError::ConfirmationInProgress);
            }
            let order = state.order.clone().ok_or(CartError::NoActiveOrder)?;
            let items = state.items.clone();
            state.phase = CartPhase::Confirming;
            (order, items)
        };

        self.sync.clear();
        Ok((order, items, user))
    }

    /// Confirmation succeeded: clear the cart.
    pub fn complete_confirmation(&self) {
        let mut state = self.lock_state();
        state.phase = CartPhase::Confirmed;
        state.order = None;
        state.items.clear();
    }

    /// Confirmation failed: keep the cart intact for a retry.
    pub fn fail_confirmation(&self) {
        let mut state = self.lock_state();
        state.phase = CartPhase::Failed;
    }

    async fn ensure_order(&self, owner: lepestok_core::TelegramId) -> Result<Order, CartError> {
        match self.store.create_order(owner).await {
            Ok(order) => Ok(order),
            // Another session (or a concurrent request) won the create race;
            // fall back to the row that exists.
            Err(RepositoryError::Conflict(_)) => {
                match self.store.get_editing_order(owner).await? {
                    Some(order) => Ok(order),
                    None => Err(CartError::Store(RepositoryError::NotFound)),
                }
            }
            Err(e) => Err(CartError::Store(e)),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
