//! Unified error handling with Sentry breadcrumbs.
//!
//! [`CartError`] is what every engine operation returns. It follows the
//! failure taxonomy the UI reacts to:
//!
//! - `Network` - the backend was unreachable or answered with a failure
//! - `Validation` - client-side input problem, detected before any network call
//! - `Auth` - the session is not authenticated
//!
//! `fetch_cart` never returns these; it degrades to an empty cart instead.

use eazika_core::{LineItemId, SavedCardId};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Client-side validation failures. No network call is made when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quantities below 1 are rejected.
    #[error("quantity must be at least 1 (got {0})")]
    QuantityBelowMinimum(i64),

    /// Quantity does not fit the backend's range.
    #[error("quantity {0} is too large")]
    QuantityTooLarge(i64),

    /// A shipping address field is blank.
    #[error("missing address field: {0}")]
    MissingAddressField(&'static str),

    /// No payment method chosen.
    #[error("payment method is required")]
    MissingPaymentMethod,

    /// UPI payment without a UPI identifier.
    #[error("UPI ID is required")]
    MissingUpiId,

    /// Card payment without a holder name.
    #[error("card holder name is required")]
    MissingCardHolder,

    /// Saved card reference that is not one of the customer's instruments.
    #[error("saved card {0} not found")]
    UnknownSavedCard(SavedCardId),

    /// New card details with a blank field.
    #[error("missing card field: {0}")]
    IncompleteNewCard(&'static str),

    /// Nothing to order.
    #[error("no items to order")]
    EmptyOrder,
}

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// The backend could not complete the operation.
    #[error("Network error: {0}")]
    Network(GatewayError),

    /// Input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The session is not authenticated.
    #[error("Authentication required: {0}")]
    Auth(GatewayError),

    /// The line item is not in the local cart.
    #[error("Cart item not found: {0}")]
    ItemNotFound(LineItemId),

    /// An order is already being submitted.
    #[error("An order submission is already in progress")]
    SubmissionInProgress,
}

impl From<GatewayError> for CartError {
    fn from(err: GatewayError) -> Self {
        if err.is_auth() {
            Self::Auth(err)
        } else {
            Self::Network(err)
        }
    }
}

impl CartError {
    /// Message safe to show to the customer.
    ///
    /// Backend details are not exposed; validation messages are shown as-is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Could not reach the store. Please try again.".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::Auth(_) => "Please sign in to continue.".to_string(),
            Self::ItemNotFound(_) => "That item is no longer in your cart.".to_string(),
            Self::SubmissionInProgress => "Your order is already being placed.".to_string(),
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

/// Add a breadcrumb for cart activity.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// operations leading up to an error. A no-op when Sentry is not initialised.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::ItemNotFound(LineItemId::new(7));
        assert_eq!(err.to_string(), "Cart item not found: 7");

        let err = CartError::from(ValidationError::MissingUpiId);
        assert_eq!(err.to_string(), "Validation error: UPI ID is required");
    }

    #[test]
    fn test_gateway_auth_failure_becomes_auth() {
        assert!(matches!(
            CartError::from(GatewayError::Unauthorized),
            CartError::Auth(_)
        ));
        assert!(matches!(
            CartError::from(GatewayError::Unavailable("down".to_string())),
            CartError::Network(_)
        ));
    }

    #[test]
    fn test_user_message_hides_backend_details() {
        let err = CartError::from(GatewayError::Status {
            status: 500,
            body: "stack trace here".to_string(),
        });
        assert!(!err.user_message().contains("stack trace"));

        let err = CartError::from(ValidationError::MissingAddressField("city"));
        assert_eq!(err.user_message(), "missing address field: city");
    }
}
