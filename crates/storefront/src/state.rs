//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use lepestok_core::{Product, TelegramUser};

use crate::cart::CartSession;
use crate::checkout::CheckoutPipeline;
use crate::config::StorefrontConfig;
use crate::db::{OrderStore, PgOrderStore};
use crate::services::{OrderNotifier, SalebotClient};

/// How long the active-catalog response may be served from cache.
const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("failed to build webhook client: {0}")]
    Webhook(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources: the pool, the injected order store, the checkout pipeline, the
/// catalog cache, and the per-identity cart session registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    store: Arc<dyn OrderStore>,
    pipeline: CheckoutPipeline,
    /// One cart session per Telegram id. Eviction only discards unflushed
    /// local state; the next load reconciles from the store.
    sessions: Cache<i64, Arc<CartSession>>,
    /// Active-catalog cache.
    catalog: Cache<&'static str, Arc<Vec<Product>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, AppStateError> {
        let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool.clone()));
        let notifier: Arc<dyn OrderNotifier> = Arc::new(SalebotClient::new(&config.webhook)?);
        let pipeline = CheckoutPipeline::new(Arc::clone(&store), notifier);

        let sessions = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(config.session_ttl)
            .build();

        let catalog = Cache::builder()
            .max_capacity(4)
            .time_to_live(CATALOG_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                pipeline,
                sessions,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the injected order store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.inner.store
    }

    /// Get the checkout pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &CheckoutPipeline {
        &self.inner.pipeline
    }

    /// Get the catalog cache.
    #[must_use]
    pub(crate) fn catalog_cache(&self) -> &Cache<&'static str, Arc<Vec<Product>>> {
        &self.inner.catalog
    }

    /// Fetch (or create and hydrate) the cart session for an identity.
    pub async fn cart_session(&self, user: &TelegramUser) -> Arc<CartSession> {
        let store = Arc::clone(&self.inner.store);
        let debounce = self.inner.config.sync_debounce;
        let identity = user.clone();

        self.inner
            .sessions
            .get_with(user.id.as_i64(), async move {
                let session = Arc::new(CartSession::new(store, Some(identity), debounce));
                // Hydrate once from the store; later requests reuse the
                // in-memory session (local state is the source of truth).
                session.load().await;
                session
            })
            .await
    }
}
