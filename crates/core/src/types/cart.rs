//! Cart records as the storefront backend shapes them.
//!
//! These are the server-shaped types. Display fields never live on them; the
//! engine joins a [`CartLineItem`] with [`ProductDisplayMetadata`] into a
//! separate view type instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{LineItemId, PriceVariantId, ProductId, UserId};
use super::price::Price;

/// One product + price-variant + quantity entry in a remote cart.
///
/// `id` is assigned by the backend. A line item only exists locally after an
/// authoritative fetch returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: LineItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(rename = "shopProductId")]
    pub product_ref: ProductId,
    #[serde(rename = "productPriceId")]
    pub price_variant_ref: PriceVariantId,
    /// Always at least 1 for records the backend returns.
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Descriptor for a line item the backend should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    #[serde(rename = "shopProductId")]
    pub product_ref: ProductId,
    #[serde(rename = "productPriceId")]
    pub price_variant_ref: PriceVariantId,
    pub quantity: u32,
}

/// Display metadata for a product, attached to line items by catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDisplayMetadata {
    pub name: String,
    pub image_url: String,
    pub unit_price: Price,
}

impl ProductDisplayMetadata {
    /// Name shown for products missing from the catalog.
    pub const PLACEHOLDER_NAME: &'static str = "Product Item";
    /// Image shown for products missing from the catalog.
    pub const PLACEHOLDER_IMAGE: &'static str = "https://placehold.co/600x600?text=No+Image";

    /// Metadata used when a product reference is not in the catalog.
    ///
    /// The zero price keeps totals defined against an incomplete catalog.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            name: Self::PLACEHOLDER_NAME.to_string(),
            image_url: Self::PLACEHOLDER_IMAGE.to_string(),
            unit_price: Price::ZERO,
        }
    }
}
