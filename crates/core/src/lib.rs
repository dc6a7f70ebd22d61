//! Eazika Core - Shared domain types.
//!
//! This crate provides the types shared between the cart engine and the tools
//! built on top of it:
//! - `storefront` - Cart synchronization engine and checkout controller
//! - `cli` - Command-line driver for a single cart session
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, contact details, payment kinds and cart records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
