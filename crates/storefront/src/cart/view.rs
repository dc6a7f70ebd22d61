//! Presentation join of line items with catalog metadata.
//!
//! [`CartView`] is rebuilt from the line items on every read; it is never the
//! source of truth and never written back.

use eazika_core::{CartLineItem, LineItemId, Price, ProductDisplayMetadata};
use serde::Serialize;

use super::catalog::ProductCatalogIndex;

/// A line item together with the display metadata of its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(flatten)]
    pub item: CartLineItem,
    pub product_details: ProductDisplayMetadata,
}

impl CartView {
    /// Line item id.
    #[must_use]
    pub const fn id(&self) -> LineItemId {
        self.item.id
    }

    /// Quantity of this line.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.item.quantity
    }

    /// Unit price from the catalog (zero for unknown products).
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.product_details.unit_price
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity())
    }
}

/// Join line items against the catalog, preserving order.
#[must_use]
pub fn join(items: &[CartLineItem], catalog: &ProductCatalogIndex) -> Vec<CartView> {
    items
        .iter()
        .map(|item| CartView {
            item: item.clone(),
            product_details: catalog.metadata(item.product_ref).clone(),
        })
        .collect()
}
