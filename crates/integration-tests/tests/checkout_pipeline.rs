//! Order confirmation pipeline tests.
//!
//! Covers the strict stage ordering, the documented store/webhook
//! divergence on notification failure, and the best-effort side channels.

use std::sync::Arc;
use std::time::Duration;

use lepestok_core::{OrderStatus, Price, TelegramId};
use lepestok_storefront::cart::{CartPhase, CartSession};
use lepestok_storefront::checkout::{CheckoutError, CheckoutPipeline};
use lepestok_storefront::db::OrderStore;
use lepestok_storefront::services::{NotifyError, OrderNotifier};

use lepestok_integration_tests::{
    MockNotifier, MockOrderStore, NotifyMode, StoreCall, order_details, product, telegram_user,
};

const DEBOUNCE: Duration = Duration::from_millis(300);

struct Harness {
    store: Arc<MockOrderStore>,
    notifier: Arc<MockNotifier>,
    session: CartSession,
    pipeline: CheckoutPipeline,
}

fn harness(mode: NotifyMode) -> Harness {
    let store = MockOrderStore::new();
    let notifier = MockNotifier::with_mode(mode);
    let session = CartSession::new(
        Arc::clone(&store) as Arc<dyn OrderStore>,
        Some(telegram_user(42)),
        DEBOUNCE,
    );
    let pipeline = CheckoutPipeline::new(
        Arc::clone(&store) as Arc<dyn OrderStore>,
        Arc::clone(&notifier) as Arc<dyn OrderNotifier>,
    );
    Harness {
        store,
        notifier,
        session,
        pipeline,
    }
}

#[tokio::test(start_paused = true)]
async fn confirm_without_order_makes_zero_remote_calls() {
    let h = harness(NotifyMode::Ok(None));

    let err = h
        .pipeline
        .confirm(&h.session, order_details())
        .await
        .expect_err("no active order");

    assert!(matches!(err, CheckoutError::NoActiveOrder));
    assert!(h.store.calls().is_empty(), "zero store calls");
    assert_eq!(h.notifier.call_count(), 0, "zero webhook calls");
}

#[tokio::test(start_paused = true)]
async fn successful_confirmation_runs_stages_in_order() {
    let h = harness(NotifyMode::Ok(Some("sb-77".to_owned())));
    let peonies = product("Пионы", 500);

    h.session.add_to_cart(&peonies, 3).await.expect("add");
    let order = h.session.current_order().expect("order");

    let confirmed = h
        .pipeline
        .confirm(&h.session, order_details())
        .await
        .expect("confirmation succeeds");

    assert_eq!(confirmed.order_id, order.id);
    assert_eq!(confirmed.salebot_client_id.as_deref(), Some("sb-77"));

    // Store state: confirmed with details patched in.
    assert_eq!(h.store.order_status(order.id), Some(OrderStatus::Confirmed));

    // Stage order: status transition strictly before the detail patch, and
    // the notification strictly after both.
    let calls = h.store.calls();
    let status_pos = calls
        .iter()
        .position(|c| matches!(c, StoreCall::UpdateOrderStatus(..)))
        .expect("status call");
    let details_pos = calls
        .iter()
        .position(|c| matches!(c, StoreCall::UpdateOrderDetails(..)))
        .expect("details call");
    assert!(status_pos < details_pos);
    assert_eq!(h.notifier.call_count(), 1);

    // Payload: subtotal 1500 + delivery 250.
    let payload = h.notifier.last_payload().expect("payload");
    assert_eq!(payload.total_amount, Price::from_rubles(1750));
    assert_eq!(payload.items.len(), 1);
    assert!(payload.order_items_text.contains("Пионы"));

    // The correlation id was persisted onto the user row.
    let user = h.store.user(TelegramId::new(42)).expect("user stored");
    assert_eq!(user.salebot_client_id.as_deref(), Some("sb-77"));

    // Local cart cleared only after everything above.
    assert_eq!(h.session.phase(), CartPhase::Confirmed);
    assert_eq!(h.session.total_items(), 0);
}

#[tokio::test(start_paused = true)]
async fn webhook_timeout_keeps_cart_and_leaves_order_confirmed() {
    let h = harness(NotifyMode::Timeout);
    let peonies = product("Пионы", 500);

    h.session.add_to_cart(&peonies, 2).await.expect("add");
    let order = h.session.current_order().expect("order");

    let err = h
        .pipeline
        .confirm(&h.session, order_details())
        .await
        .expect_err("webhook timed out");

    assert!(matches!(
        err,
        CheckoutError::Notify(NotifyError::Timeout)
    ));

    // The documented divergence: the store already says confirmed...
    assert_eq!(h.store.order_status(order.id), Some(OrderStatus::Confirmed));
    // ...while the local cart is kept for a retry.
    assert_eq!(h.session.phase(), CartPhase::Failed);
    assert_eq!(h.session.total_items(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_confirmation_can_be_retried() {
    let h = harness(NotifyMode::Timeout);
    h.session
        .add_to_cart(&product("Пионы", 500), 1)
        .await
        .expect("add");

    let first = h.pipeline.confirm(&h.session, order_details()).await;
    assert!(first.is_err());
    assert_eq!(h.session.phase(), CartPhase::Failed);

    // The endpoint recovers; the retry goes through the same stages again.
    h.notifier.set_mode(NotifyMode::Ok(None));
    let second = h
        .pipeline
        .confirm(&h.session, order_details())
        .await
        .expect("retry succeeds");

    assert_eq!(h.notifier.call_count(), 2);
    assert_eq!(
        h.store.order_status(second.order_id),
        Some(OrderStatus::Confirmed)
    );
    assert_eq!(h.session.phase(), CartPhase::Confirmed);
    assert_eq!(h.session.total_items(), 0);
}

#[tokio::test(start_paused = true)]
async fn upstream_error_preserves_status_for_diagnostics() {
    let h = harness(NotifyMode::Upstream(503, "maintenance".to_owned()));
    h.session
        .add_to_cart(&product("Пионы", 500), 1)
        .await
        .expect("add");

    let err = h
        .pipeline
        .confirm(&h.session, order_details())
        .await
        .expect_err("upstream rejected");

    match err {
        CheckoutError::Notify(NotifyError::Upstream { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.session.phase(), CartPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn correlation_id_persistence_is_best_effort() {
    let h = harness(NotifyMode::Ok(Some("sb-1".to_owned())));
    h.session
        .add_to_cart(&product("Пионы", 500), 1)
        .await
        .expect("add");

    // Every user write fails; profile enrichment and id persistence are
    // both best-effort, so confirmation must still succeed.
    h.store.fail_user_writes(true);

    let confirmed = h
        .pipeline
        .confirm(&h.session, order_details())
        .await
        .expect("confirmation unaffected");

    assert_eq!(confirmed.salebot_client_id.as_deref(), Some("sb-1"));
    assert_eq!(h.session.phase(), CartPhase::Confirmed);
    assert!(h.store.user(TelegramId::new(42)).is_none());
}

#[tokio::test(start_paused = true)]
async fn confirmation_drops_pending_coalescer_entries() {
    let h = harness(NotifyMode::Ok(None));
    let peonies = product("Пионы", 500);

    h.session.add_to_cart(&peonies, 2).await.expect("add");
    assert_eq!(h.session.pending_sync_writes(), 1);

    h.pipeline
        .confirm(&h.session, order_details())
        .await
        .expect("confirm");

    // The debounce window expires long after confirmation; the entry that
    // was pending must never be written to the finalized order.
    tokio::time::sleep(DEBOUNCE * 4).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert!(
        h.store.item_write_calls().is_empty(),
        "no item writes for a confirmed order"
    );
}

#[tokio::test(start_paused = true)]
async fn store_failure_during_submit_surfaces_and_keeps_cart() {
    let h = harness(NotifyMode::Ok(None));
    h.session
        .add_to_cart(&product("Пионы", 500), 1)
        .await
        .expect("add");

    // Point the pipeline at a store that has never seen the order, so the
    // status transition fails with NotFound.
    let rogue_store = MockOrderStore::new();
    let notifier = MockNotifier::succeeding();
    let pipeline = CheckoutPipeline::new(
        Arc::clone(&rogue_store) as Arc<dyn OrderStore>,
        Arc::clone(&notifier) as Arc<dyn OrderNotifier>,
    );

    let err = pipeline
        .confirm(&h.session, order_details())
        .await
        .expect_err("status update fails");

    assert!(matches!(err, CheckoutError::Store(_)));
    assert_eq!(h.session.phase(), CartPhase::Failed);
    assert_eq!(h.session.total_items(), 1, "cart kept for retry");
    assert_eq!(notifier.call_count(), 0, "webhook never reached");
}
