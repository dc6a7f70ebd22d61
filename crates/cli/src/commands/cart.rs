//! Cart commands.
//!
//! Every command refreshes the cart first, so edits target what the backend
//! holds now, and prints the resulting cart.

use eazika_core::{LineItemId, NewLineItem, PriceVariantId, ProductId};
use eazika_storefront::CartSession;

use super::CliError;

/// Print the cart.
pub async fn show(session: &CartSession) {
    session.fetch_cart().await;
    print_cart(session);
}

/// Add a product.
pub async fn add(
    session: &CartSession,
    product_ref: ProductId,
    price_variant_ref: PriceVariantId,
    quantity: u32,
) -> Result<(), CliError> {
    session.fetch_cart().await;
    session
        .add_to_cart(NewLineItem {
            product_ref,
            price_variant_ref,
            quantity,
        })
        .await?;
    tracing::info!("Added product {product_ref} x{quantity}");
    print_cart(session);
    Ok(())
}

/// Remove a line item.
pub async fn remove(session: &CartSession, id: LineItemId) -> Result<(), CliError> {
    session.fetch_cart().await;
    session.remove_from_cart(id).await?;
    tracing::info!("Removed line item {id}");
    print_cart(session);
    Ok(())
}

/// Set a line item's quantity.
pub async fn update(session: &CartSession, id: LineItemId, quantity: i64) -> Result<(), CliError> {
    session.fetch_cart().await;
    if quantity < 1 {
        tracing::warn!("Quantity must be at least 1; leaving line item {id} unchanged");
    }
    session.update_quantity(id, quantity).await?;
    print_cart(session);
    Ok(())
}

/// Empty the cart.
pub async fn clear(session: &CartSession) {
    session.fetch_cart().await;
    session.clear_cart().await;
    tracing::info!("Cart cleared");
}

pub(super) fn print_cart(session: &CartSession) {
    let items = session.items();
    if items.is_empty() {
        tracing::info!("Your cart is empty");
        return;
    }

    for view in &items {
        tracing::info!(
            "  #{:<6} {:<32} {:>3} x {:>10} = {:>10}",
            view.id(),
            view.product_details.name,
            view.quantity(),
            view.unit_price().display(),
            view.line_total().display(),
        );
    }
    tracing::info!(
        "{} item(s), total {}",
        session.cart_count(),
        session.cart_total().display()
    );
}
