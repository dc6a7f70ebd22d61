//! Order placement.
//!
//! [`OrderTransitionController`] is a small state machine:
//!
//! ```text
//! Idle -> Submitting -> Succeeded | Failed
//! ```
//!
//! Input is validated synchronously before any network call; a rejected
//! intent leaves the state untouched. A placed order clears the cart. A failed
//! order never touches the cart.

mod address;
mod payment;

pub use address::{ShippingAddress, ValidatedAddress};
pub use payment::{CardPayment, NewCard, PaymentDescriptor, PaymentDetails, SavedInstrument};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use eazika_core::LineItemId;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::cart::{CartSynchronizer, detached};
use crate::error::{CartError, Result, ValidationError, add_breadcrumb};
use crate::gateway::{OrderRequest, PlacedOrder};

/// Where the controller is in the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderState {
    #[default]
    Idle,
    Submitting,
    Succeeded(PlacedOrder),
    /// Holds the failure message shown to the customer.
    Failed(String),
}

/// Everything the customer entered on the checkout page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutIntent {
    pub address: ShippingAddress,
    pub payment: PaymentDetails,
}

/// Signal that the order went through and the caller should navigate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlaced {
    pub order: PlacedOrder,
    pub items: Vec<LineItemId>,
}

/// Checkout state machine. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct OrderTransitionController {
    inner: Arc<ControllerInner>,
}

#[derive(Debug, Default)]
struct ControllerInner {
    saved_instruments: Vec<SavedInstrument>,
    state: Mutex<OrderState>,
}

impl OrderTransitionController {
    /// Create an idle controller that accepts the given saved cards.
    #[must_use]
    pub fn new(saved_instruments: Vec<SavedInstrument>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                saved_instruments,
                state: Mutex::new(OrderState::Idle),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> OrderState {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        matches!(*self.lock(), OrderState::Submitting)
    }

    #[must_use]
    pub fn saved_instruments(&self) -> &[SavedInstrument] {
        &self.inner.saved_instruments
    }

    /// Return a finished controller to `Idle`. Has no effect while submitting.
    pub fn reset(&self) -> bool {
        let mut state = self.lock();
        if matches!(*state, OrderState::Submitting) {
            return false;
        }
        *state = OrderState::Idle;
        true
    }

    /// Validate an intent and build the order request for `items`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyOrder`] for no items, otherwise the
    /// first address or payment problem.
    pub fn prepare(
        &self,
        intent: &CheckoutIntent,
        items: Vec<LineItemId>,
    ) -> std::result::Result<OrderRequest, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        let address = intent.address.validate()?;
        let payment_method = intent.payment.resolve(&self.inner.saved_instruments)?;

        Ok(OrderRequest {
            address_id: address.id,
            payment_method,
            items,
        })
    }

    /// Place an order for `items` and clear `cart` once it is accepted.
    ///
    /// # Errors
    ///
    /// - [`CartError::SubmissionInProgress`] if an order is already being placed
    /// - [`CartError::Validation`] before any network call; state is unchanged
    /// - [`CartError::Auth`] / [`CartError::Network`] if the backend rejects the
    ///   order; the controller moves to `Failed` and the cart is untouched
    #[instrument(skip(self, cart, intent, items), fields(items = items.len(), method = ?intent.payment.method))]
    pub async fn submit(
        &self,
        cart: &CartSynchronizer,
        intent: &CheckoutIntent,
        items: Vec<LineItemId>,
    ) -> Result<OrderPlaced> {
        let request = self.begin(intent, items)?;

        let controller = self.clone();
        let cart = cart.clone();
        detached(async move { controller.complete(&cart, request).await }).await
    }

    fn begin(&self, intent: &CheckoutIntent, items: Vec<LineItemId>) -> Result<OrderRequest> {
        let mut state = self.lock();
        if matches!(*state, OrderState::Submitting) {
            return Err(CartError::SubmissionInProgress);
        }
        let request = self.prepare(intent, items)?;
        *state = OrderState::Submitting;
        Ok(request)
    }

    async fn complete(&self, cart: &CartSynchronizer, request: OrderRequest) -> Result<OrderPlaced> {
        match cart.gateway().create_order(&request).await {
            Ok(order) => {
                let order_id = order.id.to_string();
                info!(order_id = %order_id, method = %request.payment_method.kind(), "Order placed");
                add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
                *self.lock() = OrderState::Succeeded(order.clone());
                cart.clear_cart().await;
                Ok(OrderPlaced {
                    order,
                    items: request.items,
                })
            }
            Err(err) => {
                warn!(error = %err, "Order submission failed");
                let err = CartError::from(err);
                *self.lock() = OrderState::Failed(err.user_message());
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, OrderState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
