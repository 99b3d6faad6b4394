//! Cart state machine tests.
//!
//! Covers the cart session's invariants: derived totals as pure folds,
//! optimistic merge-on-add, lazy order creation (exactly one editing order
//! per identity), fail-soft loading, and the confirmation handshake.

use std::sync::Arc;
use std::time::Duration;

use lepestok_core::{Price, TelegramId};
use lepestok_storefront::cart::{CartError, CartPhase, CartSession};
use lepestok_storefront::db::OrderStore;

use lepestok_integration_tests::{MockOrderStore, StoreCall, product, telegram_user};

const DEBOUNCE: Duration = Duration::from_millis(300);

fn session_for(store: &Arc<MockOrderStore>, tg_id: i64) -> CartSession {
    let store: Arc<dyn OrderStore> = Arc::clone(store) as Arc<dyn OrderStore>;
    CartSession::new(store, Some(telegram_user(tg_id)), DEBOUNCE)
}

async fn settle() {
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn totals_are_recomputed_folds() {
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);
    let peonies = product("Пионы", 500);
    let roses = product("Розы", 1000);

    session.add_to_cart(&peonies, 1).await.expect("add");
    assert_eq!(session.total_items(), 1);
    assert_eq!(session.total_amount(), Price::from_rubles(500));

    session.add_to_cart(&peonies, 2).await.expect("add");
    session.add_to_cart(&roses, 1).await.expect("add");
    assert_eq!(session.total_items(), 4);
    assert_eq!(session.total_amount(), Price::from_rubles(2500));

    session.update_quantity(peonies.id, 0).expect("remove");
    assert_eq!(session.total_items(), 1);
    assert_eq!(session.total_amount(), Price::from_rubles(1000));

    session.update_quantity(roses.id, 5).expect("set");
    assert_eq!(session.total_items(), 5);
    assert_eq!(session.total_amount(), Price::from_rubles(5000));
}

#[tokio::test(start_paused = true)]
async fn add_without_identity_reports_auth_required() {
    let store = MockOrderStore::new();
    let session = CartSession::new(
        Arc::clone(&store) as Arc<dyn OrderStore>,
        None,
        DEBOUNCE,
    );

    let err = session
        .add_to_cart(&product("Пионы", 500), 1)
        .await
        .expect_err("must require auth");

    assert!(matches!(err, CartError::AuthRequired));
    assert_eq!(session.total_items(), 0);
    assert!(store.calls().is_empty(), "no remote calls without identity");
}

#[tokio::test(start_paused = true)]
async fn repeated_adds_merge_and_flush_once() {
    // The reference scenario: identity 42, product A at 500.
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);
    let a = product("A", 500);

    session.add_to_cart(&a, 1).await.expect("add");
    assert_eq!(session.total_amount(), Price::from_rubles(500));

    session.add_to_cart(&a, 2).await.expect("add");
    let items = session.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().map(|i| i.quantity), Some(3));
    assert_eq!(session.total_amount(), Price::from_rubles(1500));

    settle().await;

    let order = session.current_order().expect("order created");
    let writes = store.item_write_calls();
    assert_eq!(writes.len(), 1, "burst collapses to a single write");
    assert_eq!(
        writes.first(),
        Some(&StoreCall::UpsertOrderItem {
            order_id: order.id,
            product_id: a.id,
            quantity: 3,
            unit_price: Price::from_rubles(500),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn one_editing_order_per_session() {
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);

    session.add_to_cart(&product("A", 500), 1).await.expect("add");
    session.add_to_cart(&product("B", 700), 1).await.expect("add");

    let creates = store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StoreCall::CreateOrder(_)))
        .count();
    assert_eq!(creates, 1, "second add reuses the order from the first");
}

#[tokio::test(start_paused = true)]
async fn create_race_falls_back_to_existing_order() {
    // Another session already created the editing order; ours must converge
    // on it instead of erroring out.
    let store = MockOrderStore::new();
    let existing = store.seed_editing_order(TelegramId::new(42));

    let session = session_for(&store, 42);
    session.add_to_cart(&product("A", 500), 1).await.expect("add");

    let order = session.current_order().expect("order present");
    assert_eq!(order.id, existing.id);
}

#[tokio::test(start_paused = true)]
async fn zero_quantity_removes_line_and_deletes_row() {
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);
    let a = product("A", 500);

    session.add_to_cart(&a, 2).await.expect("add");
    settle().await;

    let order = session.current_order().expect("order");
    assert_eq!(store.item_quantity(order.id, a.id), Some(2));

    session.update_quantity(a.id, 0).expect("remove");
    assert!(session.items().is_empty(), "line removed locally at once");

    settle().await;
    assert_eq!(
        store.item_quantity(order.id, a.id),
        None,
        "row deleted remotely"
    );
    let last = store.item_write_calls().pop();
    assert!(
        matches!(last, Some(StoreCall::UpsertOrderItem { quantity: 0, .. })),
        "deletion signalled with the zero quantity"
    );
}

#[tokio::test(start_paused = true)]
async fn load_round_trips_a_persisted_cart() {
    let store = MockOrderStore::new();
    let a = product("A", 500);
    let b = product("B", 900);
    // The store joins item rows against the catalog.
    store.add_product(&a);
    store.add_product(&b);

    // A prior session's add + flush.
    {
        let session = session_for(&store, 42);
        session.add_to_cart(&a, 3).await.expect("add");
        session.add_to_cart(&b, 1).await.expect("add");
        settle().await;
    }

    // A fresh session for the same identity reproduces the cart.
    let session = session_for(&store, 42);
    session.load().await;

    assert_eq!(session.phase(), CartPhase::Editing);
    assert_eq!(session.total_items(), 4);
    assert_eq!(session.total_amount(), Price::from_rubles(2400));

    let mut quantities: Vec<(String, u32)> = session
        .items()
        .into_iter()
        .map(|item| (item.product.name, item.quantity))
        .collect();
    quantities.sort();
    assert_eq!(quantities, vec![("A".to_owned(), 3), ("B".to_owned(), 1)]);
}

#[tokio::test(start_paused = true)]
async fn load_fails_soft_on_read_errors() {
    let store = MockOrderStore::new();
    store.seed_editing_order(TelegramId::new(42));
    store.fail_reads(true);

    let session = session_for(&store, 42);
    session.load().await;

    assert_eq!(session.phase(), CartPhase::NoOrder);
    assert_eq!(session.total_items(), 0);
}

#[tokio::test(start_paused = true)]
async fn clear_drops_unflushed_writes() {
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);

    session.add_to_cart(&product("A", 500), 1).await.expect("add");
    assert_eq!(session.pending_sync_writes(), 1);

    session.clear();
    assert_eq!(session.pending_sync_writes(), 0);
    assert_eq!(session.phase(), CartPhase::NoOrder);

    settle().await;
    assert!(
        store.item_write_calls().is_empty(),
        "no writes for an abandoned cart"
    );
}

#[tokio::test(start_paused = true)]
async fn repeat_confirmation_is_rejected() {
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);
    session.add_to_cart(&product("A", 500), 1).await.expect("add");

    let first = session.begin_confirmation();
    assert!(first.is_ok());

    let second = session.begin_confirmation();
    assert!(matches!(second, Err(CartError::ConfirmationInProgress)));
}

#[tokio::test(start_paused = true)]
async fn confirmation_outcomes_update_phase() {
    let store = MockOrderStore::new();
    let session = session_for(&store, 42);
    session.add_to_cart(&product("A", 500), 1).await.expect("add");

    session.begin_confirmation().expect("begin");
    session.fail_confirmation();
    assert_eq!(session.phase(), CartPhase::Failed);
    assert_eq!(session.total_items(), 1, "failed confirm keeps the cart");

    session.begin_confirmation().expect("retry after failure");
    session.complete_confirmation();
    assert_eq!(session.phase(), CartPhase::Confirmed);
    assert_eq!(session.total_items(), 0, "successful confirm clears the cart");
    assert!(session.current_order().is_none());
}
