//! Per-customer cart session.
//!
//! [`CartSession`] composes the cart mirror, the checkout selection and the
//! order controller, and keeps the selection consistent with the cart:
//!
//! - a successful removal evicts the removed id
//! - clearing the cart (directly or through a placed order) clears the selection
//! - every fetch drops selected ids the refreshed cart no longer holds

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eazika_core::{LineItemId, NewLineItem, Price};
use tracing::{debug, instrument};

use crate::cart::{
    AggregateState, CartSynchronizer, CartView, ProductCatalogIndex, SelectionSetManager,
};
use crate::checkout::{
    CheckoutIntent, OrderPlaced, OrderState, OrderTransitionController, SavedInstrument,
};
use crate::error::Result;
use crate::gateway::RemoteCartGateway;

/// One customer's cart, selection and checkout. Clones share state.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    cart: CartSynchronizer,
    selection: Mutex<SelectionSetManager>,
    checkout: OrderTransitionController,
}

impl CartSession {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RemoteCartGateway>,
        catalog: Arc<ProductCatalogIndex>,
        saved_instruments: Vec<SavedInstrument>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                cart: CartSynchronizer::new(gateway, catalog),
                selection: Mutex::new(SelectionSetManager::new()),
                checkout: OrderTransitionController::new(saved_instruments),
            }),
        }
    }

    /// The underlying cart mirror.
    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    /// The underlying order controller.
    #[must_use]
    pub fn checkout(&self) -> &OrderTransitionController {
        &self.inner.checkout
    }

    // =========================================================================
    // Cart operations
    // =========================================================================

    /// Refresh the cart, then drop selected ids that are gone.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) {
        self.inner.cart.fetch_cart().await;
        self.reconcile_selection();
    }

    /// See [`CartSynchronizer::add_to_cart`].
    ///
    /// # Errors
    ///
    /// Propagates the synchronizer's error.
    pub async fn add_to_cart(&self, descriptor: NewLineItem) -> Result<()> {
        let result = self.inner.cart.add_to_cart(descriptor).await;
        self.reconcile_selection();
        result
    }

    /// Remove an item and evict it from the selection on success.
    ///
    /// # Errors
    ///
    /// Propagates the synchronizer's error; the selection is unchanged then.
    pub async fn remove_from_cart(&self, id: LineItemId) -> Result<()> {
        self.inner.cart.remove_from_cart(id).await?;
        if self.selection().evict(id) {
            debug!(item_id = %id, "Evicted removed item from selection");
        }
        Ok(())
    }

    /// See [`CartSynchronizer::update_quantity`].
    ///
    /// # Errors
    ///
    /// Propagates the synchronizer's error.
    pub async fn update_quantity(&self, id: LineItemId, quantity: i64) -> Result<()> {
        self.inner.cart.update_quantity(id, quantity).await
    }

    /// Empty the cart and the selection.
    pub async fn clear_cart(&self) {
        self.inner.cart.clear_cart().await;
        self.selection().clear();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Toggle an item in the checkout selection. Ids not in the cart are ignored.
    pub fn toggle_selection(&self, id: LineItemId) -> bool {
        if !self.inner.cart.contains(id) {
            debug!(item_id = %id, "Ignoring selection of item not in cart");
            return false;
        }
        self.selection().toggle(id)
    }

    /// Replace the selection. An empty input clears it.
    pub fn bulk_set_selection(&self, ids: impl IntoIterator<Item = LineItemId>) {
        let cart = &self.inner.cart;
        self.selection()
            .bulk_set(ids.into_iter().filter(|id| cart.contains(*id)));
    }

    #[must_use]
    pub fn is_selected(&self, id: LineItemId) -> bool {
        self.selection().contains(id)
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<LineItemId> {
        self.selection().ids()
    }

    /// Items the next order covers: the selection if non-empty, else the whole cart.
    #[must_use]
    pub fn effective_items(&self) -> Vec<CartView> {
        let items = self.inner.cart.items();
        let selection = self.selection();
        if selection.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|view| selection.contains(view.id()))
            .collect()
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place an order for the effective items.
    ///
    /// On success the cart and the selection are cleared. On failure neither
    /// is touched.
    ///
    /// # Errors
    ///
    /// See [`OrderTransitionController::submit`].
    #[instrument(skip(self, intent))]
    pub async fn submit_order(&self, intent: &CheckoutIntent) -> Result<OrderPlaced> {
        let items = self
            .effective_items()
            .iter()
            .map(CartView::id)
            .collect();

        let placed = self
            .inner
            .checkout
            .submit(&self.inner.cart, intent, items)
            .await?;
        self.selection().clear();
        Ok(placed)
    }

    #[must_use]
    pub fn order_state(&self) -> OrderState {
        self.inner.checkout.state()
    }

    // =========================================================================
    // Derived state
    // =========================================================================

    #[must_use]
    pub fn items(&self) -> Vec<CartView> {
        self.inner.cart.items()
    }

    #[must_use]
    pub fn aggregate(&self) -> AggregateState {
        self.inner.cart.aggregate()
    }

    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.inner.cart.cart_count()
    }

    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.inner.cart.cart_total()
    }

    /// Whether a fetch, an add or an order submission is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.cart.is_loading() || self.inner.checkout.is_submitting()
    }

    fn selection(&self) -> MutexGuard<'_, SelectionSetManager> {
        self.inner
            .selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn reconcile_selection(&self) {
        let cart = &self.inner.cart;
        self.selection().retain_only(|id| cart.contains(id));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eazika_core::AddressId;

    use super::*;
    use crate::cart::tests::{catalog, line_item};
    use crate::checkout::{PaymentDetails, ShippingAddress};
    use crate::gateway::{GatewayOp, InMemoryGateway};

    async fn session(gateway: &InMemoryGateway) -> CartSession {
        let session = CartSession::new(
            Arc::new(gateway.clone()),
            Arc::new(catalog(&[(10, 50), (20, 100), (30, 5)])),
            Vec::new(),
        );
        session.fetch_cart().await;
        session
    }

    fn seeded() -> InMemoryGateway {
        InMemoryGateway::new().with_items(vec![
            line_item(1, 10, 2),
            line_item(2, 20, 1),
            line_item(3, 30, 4),
        ])
    }

    fn cod_intent() -> CheckoutIntent {
        CheckoutIntent {
            address: ShippingAddress {
                id: AddressId::new(4),
                full_name: "Asha Rao".to_string(),
                email: "asha@example.in".to_string(),
                phone: "9876543210".to_string(),
                address: "12 MG Road".to_string(),
                zip_code: "560001".to_string(),
                city: "Bengaluru".to_string(),
                country: "India".to_string(),
            },
            payment: PaymentDetails::cod(),
        }
    }

    #[tokio::test]
    async fn test_successful_remove_evicts_selection() {
        let gateway = seeded();
        let session = session(&gateway).await;
        session.bulk_set_selection([LineItemId::new(1), LineItemId::new(2)]);

        session.remove_from_cart(LineItemId::new(1)).await.unwrap();
        assert!(!session.is_selected(LineItemId::new(1)));
        assert!(session.is_selected(LineItemId::new(2)));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_selection() {
        let gateway = seeded();
        let session = session(&gateway).await;
        session.toggle_selection(LineItemId::new(1));
        gateway.fail(GatewayOp::DeleteLineItem);

        assert!(session.remove_from_cart(LineItemId::new(1)).await.is_err());
        assert!(session.is_selected(LineItemId::new(1)));
    }

    #[tokio::test]
    async fn test_clear_and_fetch_reconcile_selection() {
        let gateway = seeded();
        let session = session(&gateway).await;
        session.bulk_set_selection([LineItemId::new(2), LineItemId::new(3)]);

        gateway.fail(GatewayOp::ListLineItems);
        session.fetch_cart().await;
        assert!(session.selected_ids().is_empty());

        gateway.recover(GatewayOp::ListLineItems);
        session.fetch_cart().await;
        session.toggle_selection(LineItemId::new(2));
        session.clear_cart().await;
        assert!(session.selected_ids().is_empty());
        assert_eq!(session.cart_count(), 0);
    }

    #[tokio::test]
    async fn test_selection_ignores_unknown_ids() {
        let gateway = seeded();
        let session = session(&gateway).await;
        assert!(!session.toggle_selection(LineItemId::new(99)));
        session.bulk_set_selection([LineItemId::new(99), LineItemId::new(3)]);
        assert_eq!(session.selected_ids(), vec![LineItemId::new(3)]);
    }

    #[tokio::test]
    async fn test_effective_items_prefers_selection() {
        let gateway = seeded();
        let session = session(&gateway).await;
        assert_eq!(session.effective_items().len(), 3);

        session.toggle_selection(LineItemId::new(3));
        let effective = session.effective_items();
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].id(), LineItemId::new(3));

        session.bulk_set_selection(Vec::new());
        assert_eq!(session.effective_items().len(), 3);
    }

    #[tokio::test]
    async fn test_order_uses_selection_and_clears_everything() {
        let gateway = seeded();
        let session = session(&gateway).await;
        session.toggle_selection(LineItemId::new(2));

        let placed = session.submit_order(&cod_intent()).await.unwrap();
        assert_eq!(placed.items, vec![LineItemId::new(2)]);
        assert_eq!(gateway.orders()[0].items, vec![LineItemId::new(2)]);
        assert_eq!(session.cart_count(), 0);
        assert!(session.selected_ids().is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart_and_selection() {
        let gateway = seeded();
        let session = session(&gateway).await;
        session.toggle_selection(LineItemId::new(2));
        gateway.fail(GatewayOp::CreateOrder);
        let before = session.cart_count();

        assert!(session.submit_order(&cod_intent()).await.is_err());
        assert_eq!(session.cart_count(), before);
        assert!(session.is_selected(LineItemId::new(2)));
        assert!(matches!(session.order_state(), OrderState::Failed(_)));
    }
}
