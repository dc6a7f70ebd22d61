//! Core types for the Eazika storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod contact;
pub mod id;
pub mod payment;
pub mod price;

pub use cart::{CartLineItem, NewLineItem, ProductDisplayMetadata};
pub use contact::{Email, EmailError, PhoneError, PhoneNumber};
pub use id::*;
pub use payment::{PaymentKind, PaymentKindError};
pub use price::Price;
