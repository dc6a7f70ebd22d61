//! Cart synchronization against the in-memory backend.

#![allow(clippy::unwrap_used)]

use eazika_core::{LineItemId, NewLineItem, Price, PriceVariantId, ProductId};
use eazika_integration_tests::{line_item, session};
use eazika_storefront::CartView;
use eazika_storefront::gateway::{GatewayOp, InMemoryGateway};

const PRICES: &[(i64, i64)] = &[(10, 50), (20, 100), (30, 5), (9, 40)];

#[tokio::test]
async fn test_totals_follow_cart_contents() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(1, 10, 2), line_item(2, 20, 1)]);
    let session = session(&gateway, PRICES);

    session.fetch_cart().await;

    assert_eq!(session.cart_total(), Price::from_units(200));
    assert_eq!(session.cart_count(), 2);
}

#[tokio::test]
async fn test_add_shows_backend_assigned_item() {
    let gateway = InMemoryGateway::new();
    gateway.set_next_item_id(7);
    let session = session(&gateway, PRICES);
    session.fetch_cart().await;

    session
        .add_to_cart(NewLineItem {
            product_ref: ProductId::new(9),
            price_variant_ref: PriceVariantId::new(1),
            quantity: 3,
        })
        .await
        .unwrap();

    let items = session.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id(), LineItemId::new(7));
    assert_eq!(items[0].quantity(), 3);
    assert_eq!(session.cart_count(), 1);
    assert_eq!(session.cart_total(), Price::from_units(120));
}

#[tokio::test]
async fn test_remove_while_offline_is_optimistic_then_restored() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(7, 9, 1)]);
    let session = session(&gateway, PRICES);
    session.fetch_cart().await;

    gateway.fail(GatewayOp::DeleteLineItem);
    gateway.hold(GatewayOp::DeleteLineItem);

    let (result, ()) = tokio::join!(session.remove_from_cart(LineItemId::new(7)), async {
        gateway.entered(GatewayOp::DeleteLineItem).await;
        assert!(session.items().is_empty());
        gateway.release(GatewayOp::DeleteLineItem);
    });

    assert!(result.is_err());
    let items = session.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id(), LineItemId::new(7));
}

#[tokio::test]
async fn test_consecutive_fetches_are_identical() {
    let gateway = InMemoryGateway::new().with_items(vec![
        line_item(1, 10, 2),
        line_item(2, 20, 1),
        line_item(3, 99, 6),
    ]);
    let session = session(&gateway, PRICES);

    session.fetch_cart().await;
    let first = session.items();
    session.fetch_cart().await;

    assert_eq!(session.items(), first);
}

#[tokio::test]
async fn test_failed_remove_restores_exact_collection() {
    let gateway = InMemoryGateway::new().with_items(vec![
        line_item(1, 10, 2),
        line_item(2, 20, 1),
        line_item(3, 30, 5),
    ]);
    let session = session(&gateway, PRICES);
    session.fetch_cart().await;
    let before = session.items();

    gateway.fail(GatewayOp::DeleteLineItem);
    assert!(session.remove_from_cart(LineItemId::new(2)).await.is_err());

    assert_eq!(session.items(), before);
}

#[tokio::test]
async fn test_quantity_floor() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(1, 10, 2)]);
    let session = session(&gateway, PRICES);
    session.fetch_cart().await;

    session.update_quantity(LineItemId::new(1), 0).await.unwrap();
    session.update_quantity(LineItemId::new(1), -1).await.unwrap();

    assert_eq!(session.items()[0].quantity(), 2);
    assert_eq!(gateway.calls(GatewayOp::UpdateLineItem), 0);
}

#[tokio::test]
async fn test_aggregates_hold_after_mutation_sequence() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(1, 10, 2)]);
    let session = session(&gateway, PRICES);
    session.fetch_cart().await;

    session
        .add_to_cart(NewLineItem {
            product_ref: ProductId::new(20),
            price_variant_ref: PriceVariantId::new(1),
            quantity: 2,
        })
        .await
        .unwrap();
    session.update_quantity(LineItemId::new(1), 5).await.unwrap();
    session
        .add_to_cart(NewLineItem {
            product_ref: ProductId::new(30),
            price_variant_ref: PriceVariantId::new(1),
            quantity: 4,
        })
        .await
        .unwrap();
    let second = session.items()[1].id();
    session.remove_from_cart(second).await.unwrap();

    let expected: Price = session.items().iter().map(CartView::line_total).sum();
    assert_eq!(session.cart_total(), expected);
    assert_eq!(session.cart_total(), Price::from_units(270));
    assert_eq!(session.cart_count(), session.items().len());
}

#[tokio::test]
async fn test_signed_out_cart_is_empty() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(1, 10, 2)]);
    gateway.fail_unauthorized(GatewayOp::ListLineItems);
    let session = session(&gateway, PRICES);

    session.fetch_cart().await;

    assert!(session.items().is_empty());
    assert_eq!(session.cart_total(), Price::ZERO);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_successful_remove_evicts_selection() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(1, 10, 2), line_item(2, 20, 1)]);
    let session = session(&gateway, PRICES);
    session.fetch_cart().await;
    session.toggle_selection(LineItemId::new(1));

    session.remove_from_cart(LineItemId::new(1)).await.unwrap();

    assert!(!session.is_selected(LineItemId::new(1)));
}

#[tokio::test]
async fn test_loading_flag_during_fetch() {
    let gateway = InMemoryGateway::new().with_items(vec![line_item(1, 10, 2)]);
    gateway.hold(GatewayOp::ListLineItems);
    let session = session(&gateway, PRICES);

    tokio::join!(session.fetch_cart(), async {
        gateway.entered(GatewayOp::ListLineItems).await;
        assert!(session.is_loading());
        gateway.release(GatewayOp::ListLineItems);
    });

    assert!(!session.is_loading());
}
