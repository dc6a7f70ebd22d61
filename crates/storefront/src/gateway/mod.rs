//! Remote cart gateway: the seam between the engine and the storefront backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for cart contents and orders
//! - [`RemoteCartGateway`] is the only way the engine talks to it
//! - [`HttpCartGateway`] is the production implementation (REST + bearer token)
//! - [`InMemoryGateway`] backs tests and offline runs (feature `test-util`)
//!
//! # Example
//!
//! ```rust,ignore
//! use eazika_storefront::gateway::{HttpCartGateway, RemoteCartGateway};
//!
//! let gateway = HttpCartGateway::new(&config.api);
//! let items = gateway.list_line_items().await?;
//! ```

mod http;
#[cfg(any(test, feature = "test-util"))]
mod memory;

pub use http::HttpCartGateway;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{GatewayOp, InMemoryGateway};

use async_trait::async_trait;
use eazika_core::{AddressId, CartLineItem, LineItemId, NewLineItem, OrderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkout::PaymentDescriptor;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The session is not authenticated (401) or not allowed (403).
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend could not be reached (used by non-HTTP gateways).
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Whether this failure means the caller is not authenticated.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Order creation request sent to the backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub address_id: AddressId,
    pub payment_method: PaymentDescriptor,
    pub items: Vec<LineItemId>,
}

/// Order acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub status: Option<String>,
}

/// Operations the engine needs from the authoritative cart backend.
///
/// Implementations must be cheap to share; the engine holds them behind an
/// `Arc` for the lifetime of a session.
#[async_trait]
pub trait RemoteCartGateway: Send + Sync {
    /// Create a line item. The backend assigns its id.
    async fn create_line_item(&self, item: NewLineItem) -> Result<CartLineItem, GatewayError>;

    /// List every line item in the caller's cart.
    async fn list_line_items(&self) -> Result<Vec<CartLineItem>, GatewayError>;

    /// Set the quantity of an existing line item.
    async fn update_line_item(
        &self,
        id: LineItemId,
        quantity: u32,
    ) -> Result<CartLineItem, GatewayError>;

    /// Delete one line item.
    async fn delete_line_item(&self, id: LineItemId) -> Result<(), GatewayError>;

    /// Delete every line item in the cart.
    async fn clear_all(&self) -> Result<(), GatewayError>;

    /// Place an order for the given items.
    async fn create_order(&self, request: &OrderRequest) -> Result<PlacedOrder, GatewayError>;
}
