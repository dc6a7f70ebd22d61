//! Checkout command.
//!
//! # Intent file
//!
//! ```yaml
//! address:
//!   id: 4
//!   fullName: Asha Rao
//!   email: asha@example.in
//!   phone: "+91 98765 43210"
//!   address: 12 MG Road
//!   zipCode: "560001"
//!   city: Bengaluru
//!   country: India
//! payment:
//!   method: upi
//!   upiId: asha@okbank
//! # Optional: order only these line items
//! select: [7, 9]
//! # Optional: cards a `savedCardId` may refer to
//! savedCards:
//!   - id: 1
//!     brand: Mastercard
//!     last4: "3156"
//!     holderName: Asha Rao
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use eazika_core::LineItemId;
use eazika_storefront::checkout::{CheckoutIntent, PaymentDetails, SavedInstrument, ShippingAddress};
use eazika_storefront::config::StorefrontConfig;
use serde::Deserialize;

use super::{CliError, cart::print_cart, connect};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentFile {
    address: ShippingAddress,
    payment: PaymentDetails,
    #[serde(default)]
    select: Vec<LineItemId>,
    #[serde(default)]
    saved_cards: Vec<SavedInstrument>,
}

/// Place an order described by an intent file.
pub async fn place_order(
    config: &StorefrontConfig,
    catalog: Option<&Path>,
    intent_path: &Path,
) -> Result<(), CliError> {
    let text = tokio::fs::read_to_string(intent_path).await?;
    let file: IntentFile = serde_yaml::from_str(&text)?;

    let session = connect(config, catalog, file.saved_cards).await?;
    session.fetch_cart().await;
    session.bulk_set_selection(file.select.iter().copied());
    let skipped = skipped_selection(&file.select, session.selected_ids().len());
    if skipped > 0 {
        tracing::warn!("{skipped} selected line item(s) are not in the cart and were skipped");
    }

    let effective = session.effective_items();
    tracing::info!(
        "Ordering {} line item(s) with {}",
        effective.len(),
        file.payment
            .method
            .map_or("no payment method", |method| method.as_str())
    );

    let intent = CheckoutIntent {
        address: file.address,
        payment: file.payment,
    };
    let placed = session.submit_order(&intent).await?;

    tracing::info!(
        "Order {} placed ({})",
        placed.order.id,
        placed.order.status.as_deref().unwrap_or("pending")
    );
    print_cart(&session);
    Ok(())
}

/// Distinct requested ids that did not make it into the selection.
fn skipped_selection(requested: &[LineItemId], selected: usize) -> usize {
    requested
        .iter()
        .collect::<BTreeSet<_>>()
        .len()
        .saturating_sub(selected)
}
