//! Write coalescer tests.
//!
//! Exercised with a paused tokio clock so the debounce window is advanced
//! deterministically.

use std::sync::Arc;
use std::time::Duration;

use lepestok_core::{OrderId, Price, ProductId};
use lepestok_storefront::cart::sync::SyncQueue;
use lepestok_storefront::db::OrderStore;

use lepestok_integration_tests::{MockOrderStore, StoreCall};

const DEBOUNCE: Duration = Duration::from_millis(300);

fn queue_for(store: &Arc<MockOrderStore>) -> SyncQueue {
    SyncQueue::new(Arc::clone(store) as Arc<dyn OrderStore>, DEBOUNCE)
}

async fn yield_a_bit() {
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn last_write_wins_within_one_window() {
    let store = MockOrderStore::new();
    let queue = queue_for(&store);
    let order_id = OrderId::generate();
    let product_id = ProductId::generate();
    let price = Price::from_rubles(500);

    // Rapid taps: 1, 5, 3 - only the final value may reach the store.
    queue.enqueue(order_id, product_id, 1, price);
    queue.enqueue(order_id, product_id, 5, price);
    queue.enqueue(order_id, product_id, 3, price);
    assert_eq!(queue.pending_len(), 1);

    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    yield_a_bit().await;

    let writes = store.item_write_calls();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes.first(),
        Some(&StoreCall::UpsertOrderItem {
            order_id,
            product_id,
            quantity: 3,
            unit_price: price,
        })
    );
    assert_eq!(queue.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn new_mutation_restarts_the_window() {
    let store = MockOrderStore::new();
    let queue = queue_for(&store);
    let order_id = OrderId::generate();
    let first = ProductId::generate();
    let second = ProductId::generate();
    let price = Price::from_rubles(100);

    queue.enqueue(order_id, first, 1, price);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Still inside the window: this restarts the timer for BOTH entries.
    queue.enqueue(order_id, second, 2, price);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(
        store.item_write_calls().is_empty(),
        "restarted window must not have flushed yet"
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    yield_a_bit().await;

    assert_eq!(store.item_write_calls().len(), 2, "one write per product");
}

#[tokio::test(start_paused = true)]
async fn independent_products_flush_independently() {
    let store = MockOrderStore::new();
    let queue = queue_for(&store);
    let order_id = OrderId::generate();
    let a = ProductId::generate();
    let b = ProductId::generate();

    queue.enqueue(order_id, a, 2, Price::from_rubles(500));
    queue.enqueue(order_id, b, 7, Price::from_rubles(900));

    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    yield_a_bit().await;

    assert_eq!(store.item_quantity(order_id, a), Some(2));
    assert_eq!(store.item_quantity(order_id, b), Some(7));
}

#[tokio::test(start_paused = true)]
async fn zero_quantity_deletes_the_row() {
    let store = MockOrderStore::new();
    let queue = queue_for(&store);
    let order_id = OrderId::generate();
    let product_id = ProductId::generate();
    let price = Price::from_rubles(500);

    queue.enqueue(order_id, product_id, 4, price);
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    yield_a_bit().await;
    assert_eq!(store.item_quantity(order_id, product_id), Some(4));

    queue.enqueue(order_id, product_id, 0, price);
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    yield_a_bit().await;

    assert_eq!(
        store.item_quantity(order_id, product_id),
        None,
        "zero quantity removes the row instead of storing it"
    );
}

#[tokio::test(start_paused = true)]
async fn flush_failure_is_not_retried() {
    let store = MockOrderStore::new();
    store.fail_item_writes(true);
    let queue = queue_for(&store);
    let order_id = OrderId::generate();
    let product_id = ProductId::generate();

    queue.enqueue(order_id, product_id, 2, Price::from_rubles(500));
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    yield_a_bit().await;

    assert_eq!(store.item_write_calls().len(), 1, "one failed attempt");

    // Long after the failure: no retry appears on its own.
    tokio::time::sleep(Duration::from_secs(5)).await;
    yield_a_bit().await;
    assert_eq!(store.item_write_calls().len(), 1);
    assert_eq!(queue.pending_len(), 0, "failed entries are not requeued");
}

#[tokio::test(start_paused = true)]
async fn clear_drops_pending_entries() {
    let store = MockOrderStore::new();
    let queue = queue_for(&store);
    let order_id = OrderId::generate();

    queue.enqueue(order_id, ProductId::generate(), 2, Price::from_rubles(500));
    queue.enqueue(order_id, ProductId::generate(), 1, Price::from_rubles(900));
    assert_eq!(queue.pending_len(), 2);

    queue.clear();
    assert_eq!(queue.pending_len(), 0);

    tokio::time::sleep(DEBOUNCE * 4).await;
    yield_a_bit().await;
    assert!(
        store.item_write_calls().is_empty(),
        "cleared entries never reach the store"
    );
}
