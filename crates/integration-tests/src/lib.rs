//! Fixtures for the cart engine integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eazika-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - synchronizer behaviour against the in-memory backend
//! - `checkout_flow` - order placement and its effect on the cart
//! - `http_session` - a full session against a mocked HTTP backend

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use eazika_core::{AddressId, CartLineItem, LineItemId, Price, PriceVariantId, ProductId};
use eazika_storefront::CartSession;
use eazika_storefront::cart::{CatalogEntry, CatalogSnapshot, ProductCatalogIndex};
use eazika_storefront::checkout::{CheckoutIntent, PaymentDetails, ShippingAddress};
use eazika_storefront::gateway::InMemoryGateway;

/// A backend line item with fixed timestamps.
#[must_use]
pub fn line_item(id: i64, product: i64, quantity: u32) -> CartLineItem {
    let at = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
        .single()
        .unwrap_or_default();
    CartLineItem {
        id: LineItemId::new(id),
        user_id: None,
        product_ref: ProductId::new(product),
        price_variant_ref: PriceVariantId::new(1),
        quantity,
        created_at: at,
        updated_at: at,
    }
}

/// Catalog with `(product, whole-rupee price)` entries.
#[must_use]
pub fn catalog(prices: &[(i64, i64)]) -> ProductCatalogIndex {
    ProductCatalogIndex::from_snapshot(CatalogSnapshot {
        products: prices
            .iter()
            .map(|&(product, price)| CatalogEntry {
                product_ref: ProductId::new(product),
                name: format!("Product {product}"),
                image_url: None,
                price: Price::from_units(price),
            })
            .collect(),
    })
}

/// A session over `gateway` with the given catalog and no saved cards.
#[must_use]
pub fn session(gateway: &InMemoryGateway, prices: &[(i64, i64)]) -> CartSession {
    CartSession::new(
        Arc::new(gateway.clone()),
        Arc::new(catalog(prices)),
        Vec::new(),
    )
}

/// A complete shipping address.
#[must_use]
pub fn address() -> ShippingAddress {
    ShippingAddress {
        id: AddressId::new(4),
        full_name: "Asha Rao".to_string(),
        email: "asha@example.in".to_string(),
        phone: "+91 98765 43210".to_string(),
        address: "12 MG Road".to_string(),
        zip_code: "560001".to_string(),
        city: "Bengaluru".to_string(),
        country: "India".to_string(),
    }
}

/// A checkout intent with a complete address.
#[must_use]
pub fn intent(payment: PaymentDetails) -> CheckoutIntent {
    CheckoutIntent {
        address: address(),
        payment,
    }
}
