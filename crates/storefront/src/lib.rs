//! Eazika storefront cart engine.
//!
//! Keeps a customer's local cart in step with the storefront backend:
//! optimistic edits with rollback, a catalog join for display, derived
//! totals, a checkout selection and the order placement state machine.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use eazika_storefront::cart::ProductCatalogIndex;
//! use eazika_storefront::config::StorefrontConfig;
//! use eazika_storefront::gateway::HttpCartGateway;
//! use eazika_storefront::session::CartSession;
//!
//! let config = StorefrontConfig::from_env()?;
//! let session = CartSession::new(
//!     Arc::new(HttpCartGateway::new(&config.api)),
//!     Arc::new(ProductCatalogIndex::empty()),
//!     Vec::new(),
//! );
//! session.fetch_cart().await;
//! println!("{} items, total {}", session.cart_count(), session.cart_total().display());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;

pub use cart::{AggregateState, CartSynchronizer, CartView, ProductCatalogIndex};
pub use error::{CartError, Result, ValidationError};
pub use session::CartSession;
