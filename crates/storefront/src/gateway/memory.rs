//! In-memory [`RemoteCartGateway`] with failure injection.
//!
//! Behaves like the backend (assigns ids, keeps insertion order) and lets a
//! test make any operation fail or park mid-flight so in-flight optimistic
//! state can be observed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use eazika_core::{CartLineItem, LineItemId, NewLineItem, OrderId, UserId};
use tokio::sync::Notify;

use super::{GatewayError, OrderRequest, PlacedOrder, RemoteCartGateway};

/// Gateway operations, used to target injected failures and holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    CreateLineItem,
    ListLineItems,
    UpdateLineItem,
    DeleteLineItem,
    ClearAll,
    CreateOrder,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Unavailable,
    Unauthorized,
}

/// A parked operation: the call signals `entered` and waits for `release`.
#[derive(Default)]
struct Hold {
    entered: Notify,
    release: Notify,
}

#[derive(Default)]
struct MemoryState {
    items: Vec<CartLineItem>,
    orders: Vec<OrderRequest>,
    next_item_id: i64,
    next_order_id: i64,
    failures: HashMap<GatewayOp, Failure>,
    holds: HashMap<GatewayOp, Arc<Hold>>,
    calls: HashMap<GatewayOp, usize>,
}

/// In-memory stand-in for the storefront backend.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryGateway {
    /// Create an empty backend whose first assigned line item id is 1.
    #[must_use]
    pub fn new() -> Self {
        let gateway = Self::default();
        {
            let mut state = gateway.lock();
            state.next_item_id = 1;
            state.next_order_id = 1;
        }
        gateway
    }

    /// Seed the backend with existing line items.
    #[must_use]
    pub fn with_items(self, items: Vec<CartLineItem>) -> Self {
        {
            let mut state = self.lock();
            let max_id = items.iter().map(|i| i.id.as_i64()).max().unwrap_or(0);
            state.next_item_id = state.next_item_id.max(max_id + 1);
            state.items = items;
        }
        self
    }

    /// Set the id the backend assigns to the next created line item.
    pub fn set_next_item_id(&self, id: i64) {
        self.lock().next_item_id = id;
    }

    /// Make every call of `op` fail as if the backend were unreachable.
    pub fn fail(&self, op: GatewayOp) {
        self.lock().failures.insert(op, Failure::Unavailable);
    }

    /// Make every call of `op` fail as unauthenticated.
    pub fn fail_unauthorized(&self, op: GatewayOp) {
        self.lock().failures.insert(op, Failure::Unauthorized);
    }

    /// Stop failing calls of `op`.
    pub fn recover(&self, op: GatewayOp) {
        self.lock().failures.remove(&op);
    }

    /// Park the next calls of `op` until [`Self::release`] is called.
    pub fn hold(&self, op: GatewayOp) {
        self.lock().holds.insert(op, Arc::new(Hold::default()));
    }

    /// Wait until a call of a held `op` has reached the backend.
    pub async fn entered(&self, op: GatewayOp) {
        let hold = self.lock().holds.get(&op).cloned();
        if let Some(hold) = hold {
            hold.entered.notified().await;
        }
    }

    /// Let a parked call of `op` continue and stop holding later calls.
    pub fn release(&self, op: GatewayOp) {
        if let Some(hold) = self.lock().holds.remove(&op) {
            hold.release.notify_one();
        }
    }

    /// Number of calls of `op` received so far.
    #[must_use]
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Snapshot of the backend's line items.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.lock().items.clone()
    }

    /// Orders the backend accepted.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.lock().orders.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, wait out any hold, then apply any injected failure.
    async fn enter(&self, op: GatewayOp) -> Result<(), GatewayError> {
        let hold = {
            let mut state = self.lock();
            *state.calls.entry(op).or_insert(0) += 1;
            state.holds.get(&op).cloned()
        };

        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        match self.lock().failures.get(&op) {
            Some(Failure::Unavailable) => Err(GatewayError::Unavailable(format!(
                "{op:?} failed: backend unreachable"
            ))),
            Some(Failure::Unauthorized) => Err(GatewayError::Unauthorized),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteCartGateway for InMemoryGateway {
    async fn create_line_item(&self, item: NewLineItem) -> Result<CartLineItem, GatewayError> {
        self.enter(GatewayOp::CreateLineItem).await?;

        let mut state = self.lock();
        let now = Utc::now();
        let created = CartLineItem {
            id: LineItemId::new(state.next_item_id),
            user_id: Some(UserId::new(1)),
            product_ref: item.product_ref,
            price_variant_ref: item.price_variant_ref,
            quantity: item.quantity,
            created_at: now,
            updated_at: now,
        };
        state.next_item_id += 1;
        state.items.push(created.clone());
        Ok(created)
    }

    async fn list_line_items(&self) -> Result<Vec<CartLineItem>, GatewayError> {
        self.enter(GatewayOp::ListLineItems).await?;
        Ok(self.items())
    }

    async fn update_line_item(
        &self,
        id: LineItemId,
        quantity: u32,
    ) -> Result<CartLineItem, GatewayError> {
        self.enter(GatewayOp::UpdateLineItem).await?;

        let mut state = self.lock();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("cart item {id}")))?;
        item.quantity = quantity;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_line_item(&self, id: LineItemId) -> Result<(), GatewayError> {
        self.enter(GatewayOp::DeleteLineItem).await?;

        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|i| i.id != id);
        if state.items.len() == before {
            return Err(GatewayError::NotFound(format!("cart item {id}")));
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), GatewayError> {
        self.enter(GatewayOp::ClearAll).await?;
        self.lock().items.clear();
        Ok(())
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        self.enter(GatewayOp::CreateOrder).await?;

        let mut state = self.lock();
        let id = OrderId::new(state.next_order_id);
        state.next_order_id += 1;
        state.orders.push(request.clone());
        Ok(PlacedOrder {
            id,
            status: Some("PLACED".to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eazika_core::{PriceVariantId, ProductId};

    use super::*;

    fn descriptor(product: i64) -> NewLineItem {
        NewLineItem {
            product_ref: ProductId::new(product),
            price_variant_ref: PriceVariantId::new(1),
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn test_assigns_sequential_ids() {
        let gateway = InMemoryGateway::new();
        let a = gateway.create_line_item(descriptor(1)).await.unwrap();
        let b = gateway.create_line_item(descriptor(2)).await.unwrap();
        assert_eq!(a.id, LineItemId::new(1));
        assert_eq!(b.id, LineItemId::new(2));
        assert_eq!(gateway.list_line_items().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_until_recovered() {
        let gateway = InMemoryGateway::new();
        gateway.fail(GatewayOp::ListLineItems);
        assert!(gateway.list_line_items().await.is_err());

        gateway.recover(GatewayOp::ListLineItems);
        assert!(gateway.list_line_items().await.is_ok());
        assert_eq!(gateway.calls(GatewayOp::ListLineItems), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_item_is_not_found() {
        let gateway = InMemoryGateway::new();
        let err = gateway
            .delete_line_item(LineItemId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_hold_parks_call_until_release() {
        let gateway = InMemoryGateway::new();
        gateway.hold(GatewayOp::ClearAll);

        let observer = gateway.clone();
        let ((), result) = tokio::join!(
            async move {
                observer.entered(GatewayOp::ClearAll).await;
                assert_eq!(observer.calls(GatewayOp::ClearAll), 1);
                observer.release(GatewayOp::ClearAll);
            },
            gateway.clear_all()
        );
        assert!(result.is_ok());
    }
}
