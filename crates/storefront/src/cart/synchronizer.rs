//! Local mirror of the remote cart.
//!
//! [`CartSynchronizer`] owns the line-item collection for one session and keeps
//! it in step with the backend:
//!
//! - `fetch_cart` replaces the collection wholesale; any failure yields an
//!   empty cart instead of an error
//! - `add_to_cart` never inserts locally; it creates remotely, then refetches
//! - `remove_from_cart` / `update_quantity` are optimistic and restore the
//!   exact prior snapshot on failure
//! - `clear_cart` is optimistic and is never rolled back
//!
//! # Mutation ordering
//!
//! Every operation that writes the collection runs behind one per-cart
//! mutation gate, so a mutation's snapshot is always taken after the previous
//! mutation confirmed or rolled back. Optimistic edits are still published
//! before the backend call, so readers see them immediately.
//!
//! Operations run on their own task: a caller that stops waiting does not
//! abort the backend call, and the rollback still happens.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use eazika_core::{CartLineItem, LineItemId, NewLineItem, Price};
use tokio::sync::Mutex;
use tracing::{Instrument, debug, info, instrument, warn};

use super::aggregate::AggregateState;
use super::catalog::ProductCatalogIndex;
use super::command::{CartCommand, RollbackPolicy};
use super::view::{CartView, join};
use crate::error::{CartError, Result, ValidationError, add_breadcrumb};
use crate::gateway::{GatewayError, RemoteCartGateway};

/// Session-scoped cart mirror.
///
/// Cheaply cloneable; clones share the same collection.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<SynchronizerInner>,
}

struct SynchronizerInner {
    gateway: Arc<dyn RemoteCartGateway>,
    catalog: Arc<ProductCatalogIndex>,
    state: RwLock<CartState>,
    mutations: Mutex<()>,
    loading: AtomicUsize,
}

#[derive(Default)]
struct CartState {
    items: Vec<CartLineItem>,
    aggregate: AggregateState,
}

/// Marks the synchronizer as loading until dropped.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CartSynchronizer {
    /// Create an empty cart mirror.
    #[must_use]
    pub fn new(gateway: Arc<dyn RemoteCartGateway>, catalog: Arc<ProductCatalogIndex>) -> Self {
        Self {
            inner: Arc::new(SynchronizerInner {
                gateway,
                catalog,
                state: RwLock::new(CartState::default()),
                mutations: Mutex::new(()),
                loading: AtomicUsize::new(0),
            }),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replace the local collection with the backend's.
    ///
    /// Network and authentication failures leave an empty cart with zero
    /// aggregates; they are logged, never returned.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) {
        let inner = Arc::clone(&self.inner);
        let result = detached(async move {
            inner.fetch().await;
            Ok(())
        })
        .await;

        if let Err(err) = result {
            warn!(error = %err, "Cart refresh task did not complete");
        }
    }

    /// Create a line item remotely, then refetch the whole cart.
    ///
    /// The refetch happens even if creation failed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero quantity (no network call), or the
    /// creation failure after the refetch.
    #[instrument(skip(self), fields(product = %descriptor.product_ref, quantity = descriptor.quantity))]
    pub async fn add_to_cart(&self, descriptor: NewLineItem) -> Result<()> {
        if descriptor.quantity < 1 {
            return Err(ValidationError::QuantityBelowMinimum(i64::from(descriptor.quantity)).into());
        }

        let inner = Arc::clone(&self.inner);
        detached(async move { inner.add(descriptor).await }).await
    }

    /// Optimistically remove a line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the local
    /// cart (no network call), or the backend failure after restoring the
    /// previous cart.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn remove_from_cart(&self, id: LineItemId) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        detached(async move { inner.execute(CartCommand::Remove(id)).await }).await
    }

    /// Optimistically set a line item's quantity.
    ///
    /// Quantities below 1 are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the local
    /// cart, a validation error if `quantity` exceeds the backend's range, or
    /// the backend failure after restoring the previous cart.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn update_quantity(&self, id: LineItemId, quantity: i64) -> Result<()> {
        if quantity < 1 {
            debug!(quantity, "Ignoring quantity below 1");
            return Ok(());
        }
        let quantity =
            u32::try_from(quantity).map_err(|_| ValidationError::QuantityTooLarge(quantity))?;

        let inner = Arc::clone(&self.inner);
        detached(async move {
            inner
                .execute(CartCommand::SetQuantity { id, quantity })
                .await
        })
        .await
    }

    /// Empty the cart locally and ask the backend to do the same.
    ///
    /// A backend failure is logged and the local cart stays empty.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(err) = detached(async move { inner.execute(CartCommand::Clear).await }).await {
            warn!(error = %err, "Clear cart did not complete");
        }
    }

    // =========================================================================
    // Read-only state
    // =========================================================================

    /// Current cart joined with catalog metadata.
    #[must_use]
    pub fn items(&self) -> Vec<CartView> {
        join(&self.inner.read().items, &self.inner.catalog)
    }

    /// Current server-shaped line items.
    #[must_use]
    pub fn line_items(&self) -> Vec<CartLineItem> {
        self.inner.read().items.clone()
    }

    /// Whether the line item is in the local cart.
    #[must_use]
    pub fn contains(&self, id: LineItemId) -> bool {
        self.inner.read().items.iter().any(|item| item.id == id)
    }

    /// Current aggregates.
    #[must_use]
    pub fn aggregate(&self) -> AggregateState {
        self.inner.read().aggregate
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.aggregate().count()
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.aggregate().total_amount()
    }

    /// Whether a fetch or add is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst) > 0
    }

    /// The catalog used for the display join.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalogIndex {
        &self.inner.catalog
    }

    /// The backend gateway this cart talks to.
    #[must_use]
    pub fn gateway(&self) -> Arc<dyn RemoteCartGateway> {
        Arc::clone(&self.inner.gateway)
    }
}

impl SynchronizerInner {
    fn read(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<CartLineItem> {
        self.read().items.clone()
    }

    /// Replace the collection and recompute the aggregates.
    fn publish(&self, items: Vec<CartLineItem>) {
        let aggregate = AggregateState::compute(&join(&items, &self.catalog));
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.items = items;
        state.aggregate = aggregate;
    }

    async fn fetch(&self) {
        let _gate = self.mutations.lock().await;
        let _loading = LoadingGuard::enter(&self.loading);
        self.refresh().await;
    }

    /// Authoritative refresh. Callers hold the mutation gate.
    async fn refresh(&self) {
        match self.gateway.list_line_items().await {
            Ok(mut items) => {
                let before = items.len();
                items.retain(|item| item.quantity >= 1);
                if items.len() != before {
                    warn!(
                        dropped = before - items.len(),
                        "Backend returned line items with zero quantity"
                    );
                }
                debug!(count = items.len(), "Cart refreshed");
                self.publish(items);
            }
            Err(err) if err.is_auth() => {
                info!("Cart unavailable without authentication; showing empty cart");
                self.publish(Vec::new());
            }
            Err(err) => {
                warn!(error = %err, "Failed to fetch cart; showing empty cart");
                self.publish(Vec::new());
            }
        }
    }

    async fn add(&self, descriptor: NewLineItem) -> Result<()> {
        let _gate = self.mutations.lock().await;
        let _loading = LoadingGuard::enter(&self.loading);

        let created = self.gateway.create_line_item(descriptor).await;
        self.refresh().await;

        match created {
            Ok(item) => {
                info!(item_id = %item.id, "Line item created");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to add item to cart");
                Err(err.into())
            }
        }
    }

    async fn execute(&self, command: CartCommand) -> Result<()> {
        let _gate = self.mutations.lock().await;

        let snapshot = self.snapshot();
        let mut optimistic = snapshot.clone();
        command.apply(&mut optimistic)?;
        self.publish(optimistic);

        match self.send(command).await {
            Ok(confirmed) => {
                if confirmed.is_some() {
                    let mut items = self.snapshot();
                    command.confirm(&mut items, confirmed);
                    self.publish(items);
                }
                debug!(command = command.name(), "Mutation confirmed");
                Ok(())
            }
            Err(err) => {
                let mut items = self.snapshot();
                command.rollback(&mut items, snapshot);
                self.publish(items);

                match command.rollback_policy() {
                    RollbackPolicy::RestoreSnapshot => {
                        warn!(command = command.name(), error = %err, "Mutation failed; restored previous cart");
                        add_breadcrumb(
                            "cart",
                            "Rolled back optimistic update",
                            Some(&[("command", command.name())]),
                        );
                        Err(err.into())
                    }
                    RollbackPolicy::KeepOptimistic => {
                        warn!(command = command.name(), error = %err, "Mutation failed; keeping local state");
                        Ok(())
                    }
                }
            }
        }
    }

    async fn send(&self, command: CartCommand) -> std::result::Result<Option<CartLineItem>, GatewayError> {
        match command {
            CartCommand::Remove(id) => self.gateway.delete_line_item(id).await.map(|()| None),
            CartCommand::SetQuantity { id, quantity } => {
                self.gateway.update_line_item(id, quantity).await.map(Some)
            }
            CartCommand::Clear => self.gateway.clear_all().await.map(|()| None),
        }
    }
}

/// Run an operation on its own task so it completes even if the caller stops waiting.
pub(crate) async fn detached<T, F>(future: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    match tokio::spawn(future.in_current_span()).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => Err(CartError::Network(GatewayError::Unavailable(format!(
            "cart task cancelled: {err}"
        )))),
    }
}
