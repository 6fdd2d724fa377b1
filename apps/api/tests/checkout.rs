//! Checkout pipeline scenarios driven through the service layer.

mod common;

use chrono::Duration;

use common::{address, Fixture};
use meridian_api::api_types::{AddToCartRequest, CreateOrderRequest, PayOrderRequest};
use meridian_api::services::{CartService, OrderService};
use meridian_api::{ApiConfig, ErrorCode};
use meridian_core::{CartLine, DiscountKind, OrderStatus};

fn lines(items: &[(&str, i64)]) -> Option<Vec<CartLine>> {
    Some(items.iter().map(|(id, q)| CartLine::new(*id, *q)).collect())
}

#[tokio::test]
async fn percentage_discount_and_configured_shipping() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 5000, 10).await;
    fx.add_discount("SAVE20", DiscountKind::Percentage, 2000, Duration::days(1)).await;
    fx.add_shipping_rate("Egypt", "Cairo", 700).await;

    let order = OrderService::new(fx.state.clone())
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: lines(&[(lamp.id.as_str(), 2)]),
                promocode: Some("SAVE20".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::NotPaid);
    assert_eq!(order.costing.sub_total_cents, 10_000);
    assert_eq!(order.costing.discount_amount_cents, 2_000);
    assert_eq!(order.costing.amount_after_discount_cents, 8_000);
    assert_eq!(order.costing.shipping_cost_cents, 700);
    assert_eq!(order.costing.grand_total_cents, 8_700);
    assert!(order.costing.discount_applied);
    assert!(order.costing.is_consistent());
    // Default address came from the profile.
    assert_eq!(order.address.region, "Cairo");
}

#[tokio::test]
async fn fixed_discount_is_capped_at_subtotal() {
    let fx = Fixture::new().await;
    let pin = fx.add_product("Pin", 3000, 10).await;
    fx.add_discount("FLAT50", DiscountKind::Fixed, 5000, Duration::days(1)).await;

    let order = OrderService::new(fx.state.clone())
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: lines(&[(pin.id.as_str(), 1)]),
                promocode: Some("FLAT50".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(order.costing.discount_amount_cents, 3000);
    assert_eq!(order.costing.amount_after_discount_cents, 0);
}

#[tokio::test]
async fn expired_or_unknown_promocode_is_ignored() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 5000, 10).await;
    fx.add_discount("OLD", DiscountKind::Percentage, 2000, Duration::days(-1)).await;
    let service = OrderService::new(fx.state.clone());

    for code in ["OLD", "NOPE"] {
        let order = service
            .create_order(
                &Fixture::ctx(&fx.shopper),
                CreateOrderRequest {
                    lines: lines(&[(lamp.id.as_str(), 1)]),
                    promocode: Some(code.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!order.costing.discount_applied);
        assert_eq!(order.costing.discount_amount_cents, 0);
        assert_eq!(order.costing.sub_total_cents, 5000);
    }
}

#[tokio::test]
async fn missing_shipping_rate_uses_default() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 10).await;

    let order = OrderService::new(fx.state.clone())
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: lines(&[(lamp.id.as_str(), 1)]),
                address: Some(address("Atlantis", "Deep")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(order.costing.shipping_cost_cents, 1000);
    assert_eq!(order.costing.shipping_id, None);
    assert_eq!(order.costing.grand_total_cents, 3500);
}

#[tokio::test]
async fn insufficient_stock_persists_nothing() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 2).await;

    let err = OrderService::new(fx.state.clone())
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: lines(&[(lamp.id.as_str(), 5)]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessRule);
    assert!(err.message.contains("Lamp"));
    assert_eq!(fx.order_count().await, 0);
    assert_eq!(fx.stock_of(&lamp.id).await, 2);
}

#[tokio::test]
async fn duplicate_lines_are_checked_together() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 3).await;

    let err = OrderService::new(fx.state.clone())
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: lines(&[(lamp.id.as_str(), 2), (lamp.id.as_str(), 2)]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessRule);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let fx = Fixture::new().await;
    let service = OrderService::new(fx.state.clone());

    // Stored cart is empty.
    let err = service
        .create_order(&Fixture::ctx(&fx.shopper), CreateOrderRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessRule);

    // Explicit empty list.
    let err = service
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessRule);
    assert_eq!(fx.order_count().await, 0);
}

#[tokio::test]
async fn no_address_available() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 3).await;

    let err = OrderService::new(fx.state.clone())
        .create_order(
            &Fixture::ctx(&fx.other_shopper),
            CreateOrderRequest {
                lines: lines(&[(lamp.id.as_str(), 1)]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessRule);
    assert_eq!(fx.order_count().await, 0);
}

#[tokio::test]
async fn creation_uses_stored_cart_and_leaves_stock_and_cart_alone() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 5).await;
    let ctx = Fixture::ctx(&fx.shopper);

    CartService::new(fx.state.clone())
        .add_to_cart(
            &ctx,
            AddToCartRequest {
                product_id: lamp.id.clone(),
                quantity: 2,
            },
        )
        .await
        .unwrap();

    let order = OrderService::new(fx.state.clone())
        .create_order(&ctx, CreateOrderRequest::default())
        .await
        .unwrap();

    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 2);
    assert_eq!(order.lines[0].title, "Lamp");
    assert_eq!(fx.stock_of(&lamp.id).await, 5);

    let cart = CartService::new(fx.state.clone()).get_cart(&ctx).await.unwrap();
    assert_eq!(cart.total_quantity(), 2);
}

#[tokio::test]
async fn payment_decrements_stock_once_and_clears_cart() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 5).await;
    let ctx = Fixture::ctx(&fx.shopper);
    let carts = CartService::new(fx.state.clone());
    let orders = OrderService::new(fx.state.clone());

    carts
        .add_to_cart(
            &ctx,
            AddToCartRequest {
                product_id: lamp.id.clone(),
                quantity: 2,
            },
        )
        .await
        .unwrap();
    let order = orders.create_order(&ctx, CreateOrderRequest::default()).await.unwrap();

    let confirmation = orders
        .complete_payment(
            &ctx,
            &order.id,
            PayOrderRequest {
                payment_details: Some(serde_json::json!({ "provider": "test", "ref": "abc" })),
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmation.status, OrderStatus::Pending);
    assert_eq!(confirmation.grand_total_cents, order.costing.grand_total_cents);
    assert_eq!(fx.stock_of(&lamp.id).await, 3);
    assert!(carts.get_cart(&ctx).await.unwrap().is_empty());

    let err = orders
        .complete_payment(&ctx, &order.id, PayOrderRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);
    assert_eq!(fx.stock_of(&lamp.id).await, 3);

    let stored = orders.get_order(&ctx, &order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.payment_details.unwrap()["ref"], "abc");
}

#[tokio::test]
async fn payment_by_someone_else_is_forbidden() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 5).await;
    let orders = OrderService::new(fx.state.clone());

    let order = orders
        .create_order(
            &Fixture::ctx(&fx.shopper),
            CreateOrderRequest {
                lines: lines(&[(lamp.id.as_str(), 1)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = orders
        .complete_payment(&Fixture::ctx(&fx.other_shopper), &order.id, PayOrderRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Forbidden);
    assert_eq!(err.message, "forbidden");

    let err = orders
        .complete_payment(&Fixture::ctx(&fx.shopper), "no-such-order", PayOrderRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(fx.stock_of(&lamp.id).await, 5);
}

#[tokio::test]
async fn payment_rolls_back_when_stock_ran_out() {
    let fx = Fixture::new().await;
    let lamp = fx.add_product("Lamp", 2500, 2).await;
    let orders = OrderService::new(fx.state.clone());
    let ctx = Fixture::ctx(&fx.shopper);

    let first = orders
        .create_order(&ctx, CreateOrderRequest { lines: lines(&[(lamp.id.as_str(), 2)]), ..Default::default() })
        .await
        .unwrap();
    let second = orders
        .create_order(&ctx, CreateOrderRequest { lines: lines(&[(lamp.id.as_str(), 2)]), ..Default::default() })
        .await
        .unwrap();

    orders.complete_payment(&ctx, &first.id, PayOrderRequest::default()).await.unwrap();
    let err = orders
        .complete_payment(&ctx, &second.id, PayOrderRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessRule);
    assert_eq!(fx.stock_of(&lamp.id).await, 0);
    let second = orders.get_order(&ctx, &second.id).await.unwrap();
    assert_eq!(second.status, OrderStatus::NotPaid);
}

#[tokio::test]
async fn payment_without_stock_floor_goes_negative() {
    let fx = Fixture::with_config(ApiConfig {
        enforce_stock_floor: false,
        ..ApiConfig::default()
    })
    .await;
    let lamp = fx.add_product("Lamp", 2500, 2).await;
    let orders = OrderService::new(fx.state.clone());
    let ctx = Fixture::ctx(&fx.shopper);

    let first = orders
        .create_order(&ctx, CreateOrderRequest { lines: lines(&[(lamp.id.as_str(), 2)]), ..Default::default() })
        .await
        .unwrap();
    let second = orders
        .create_order(&ctx, CreateOrderRequest { lines: lines(&[(lamp.id.as_str(), 2)]), ..Default::default() })
        .await
        .unwrap();

    orders.complete_payment(&ctx, &first.id, PayOrderRequest::default()).await.unwrap();
    orders.complete_payment(&ctx, &second.id, PayOrderRequest::default()).await.unwrap();

    assert_eq!(fx.stock_of(&lamp.id).await, -2);
}
