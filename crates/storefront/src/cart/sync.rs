//! Write coalescer for cart mutations.
//!
//! Rapid quantity edits (plus/minus taps, add/remove bursts) must not turn
//! into one store write per tap. The queue keeps the *latest desired
//! quantity* per product and flushes the whole map once the debounce window
//! elapses without further edits. Only the final quantity per product is
//! ever transmitted; intermediate values are deliberately collapsed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

use lepestok_core::{OrderId, Price, ProductId};

use crate::db::OrderStore;

/// The latest desired state for one product line.
#[derive(Debug, Clone, Copy)]
struct PendingWrite {
    /// Desired quantity; at or below zero signals deletion.
    quantity: i32,
    /// Unit price captured at enqueue time.
    unit_price: Price,
}

/// Debounced, last-write-wins write queue for one cart session.
///
/// State machine: `{ pending, timer, generation }`. Each enqueue restarts
/// the window timer and bumps the generation; a timer that fires with a
/// stale generation drains nothing. Flush failures are logged and never
/// retried - the optimistic local cart stays authoritative until the next
/// mutation or reload.
///
/// Cheaply cloneable via an inner `Arc`.
#[derive(Clone)]
pub struct SyncQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    store: Arc<dyn OrderStore>,
    debounce: Duration,
    state: Mutex<QueueState>,
}

struct QueueState {
    /// Order the pending writes belong to.
    order: Option<OrderId>,
    pending: HashMap<ProductId, PendingWrite>,
    timer: Option<AbortHandle>,
    generation: u64,
}

impl SyncQueue {
    /// Create a queue flushing into the given store after `debounce`.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                debounce,
                state: Mutex::new(QueueState {
                    order: None,
                    pending: HashMap::new(),
                    timer: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// Record the latest desired quantity for a product and restart the
    /// debounce window.
    pub fn enqueue(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    ) {
        let mut state = self.inner.lock_state();
        state.order = Some(order_id);
        state.pending.insert(
            product_id,
            PendingWrite {
                quantity,
                unit_price,
            },
        );
        QueueInner::restart_timer(&self.inner, &mut state);
    }

    /// Drop all pending writes without flushing.
    ///
    /// Called when the cart is cleared or confirmation begins: a finalized
    /// or abandoned order must not receive further item writes. Writes
    /// already dispatched are not recalled.
    pub fn clear(&self) {
        let mut state = self.inner.lock_state();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.pending.clear();
        state.order = None;
    }

    /// Number of not-yet-flushed entries.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }
}

impl QueueInner {
    fn restart_timer(inner: &Arc<Self>, state: &mut QueueState) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        let generation = state.generation;

        let queue = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(queue.debounce).await;
            queue.flush(generation);
        });
        state.timer = Some(handle.abort_handle());
    }

    /// Drain the map if `generation` is still current and dispatch the
    /// writes.
    ///
    /// There is no await between the generation check and the dispatch, and
    /// the writes run on a detached task: once the window has expired, a
    /// concurrent enqueue or clear can no longer cancel writes that are
    /// going out.
    fn flush(&self, generation: u64) {
        let (order_id, drained) = {
            let mut state = self.lock_state();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            let Some(order_id) = state.order else {
                state.pending.clear();
                return;
            };
            (order_id, std::mem::take(&mut state.pending))
        };

        if drained.is_empty() {
            return;
        }

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            for (product_id, write) in drained {
                if let Err(e) = store
                    .upsert_order_item(order_id, product_id, write.quantity, write.unit_price)
                    .await
                {
                    tracing::warn!(
                        %order_id,
                        %product_id,
                        error = %e,
                        "cart sync write failed; local cart remains authoritative"
                    );
                }
            }
        });
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
