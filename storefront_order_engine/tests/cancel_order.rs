use log::*;
use soe_common::Money;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_order_engine::{
    db_types::{OrderId, OrderStatusType},
    events::EventProducers,
    order_objects::{OrderItemRequest, OrderRequest},
    OrderFlowApi,
    OrderFlowDatabase,
    OrderFlowError,
    SqliteDatabase,
};

mod support;

use support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{self, Fixtures, BUYER_POINTS, STOCK_PER_SIZE},
};

async fn setup() -> (OrderFlowApi<SqliteDatabase>, Fixtures) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let fixtures = seed::storefront_fixtures(db.pool()).await;
    (OrderFlowApi::new(db, EventProducers::default()), fixtures)
}

async fn tear_down(mut api: OrderFlowApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

fn request(items: Vec<OrderItemRequest>, use_points: i64) -> OrderRequest {
    OrderRequest {
        recipient: "Alice Kim".to_string(),
        phone: "010-1234-5678".to_string(),
        address: "12 Mapo-daero, Seoul".to_string(),
        items,
        use_points: Money::from(use_points),
    }
}

fn line(product_id: i64, size_id: i64, quantity: i64) -> OrderItemRequest {
    OrderItemRequest { product_id, size_id, quantity }
}

#[tokio::test]
async fn cancelling_restores_stock_and_points_exactly() {
    let (api, fx) = setup().await;
    let pool = api.db().pool().clone();
    let placed = api
        .place_order(fx.buyer, request(vec![line(fx.product, fx.size_260, 3)], 400))
        .await
        .expect("Error placing order");
    assert_eq!(seed::stock_of(&pool, fx.product, fx.size_260).await, STOCK_PER_SIZE - 3);
    assert_eq!(seed::points_of(&pool, fx.buyer).await, BUYER_POINTS - 400);

    let cancelled = api.cancel_order(fx.buyer, &placed.order.order_id).await.expect("Error cancelling order");
    assert_eq!(cancelled.order.status, OrderStatusType::Cancelled);
    assert_eq!(seed::stock_of(&pool, fx.product, fx.size_260).await, STOCK_PER_SIZE);
    assert_eq!(seed::points_of(&pool, fx.buyer).await, BUYER_POINTS);

    // The order row survives as the historical record, in its terminal state.
    let stored = api
        .db()
        .fetch_order(&placed.order.order_id)
        .await
        .expect("Error fetching order")
        .expect("Order disappeared");
    assert_eq!(stored.order.status, OrderStatusType::Cancelled);
    assert_eq!(stored.items.len(), 1);
    tear_down(api).await;
}

#[tokio::test]
async fn a_second_cancellation_changes_nothing() {
    let (api, fx) = setup().await;
    let pool = api.db().pool().clone();
    let placed = api
        .place_order(fx.buyer, request(vec![line(fx.product, fx.size_260, 3)], 400))
        .await
        .expect("Error placing order");
    api.cancel_order(fx.buyer, &placed.order.order_id).await.expect("Error cancelling order");

    let err = api
        .cancel_order(fx.buyer, &placed.order.order_id)
        .await
        .expect_err("A cancelled order cannot be cancelled again");
    assert!(matches!(
        err,
        OrderFlowError::IllegalStateTransition { from: OrderStatusType::Cancelled, to: OrderStatusType::Cancelled, .. }
    ));

    // No double restock, no double refund.
    assert_eq!(seed::stock_of(&pool, fx.product, fx.size_260).await, STOCK_PER_SIZE);
    assert_eq!(seed::points_of(&pool, fx.buyer).await, BUYER_POINTS);
    tear_down(api).await;
}

#[tokio::test]
async fn only_the_owner_can_cancel() {
    let (api, fx) = setup().await;
    let pool = api.db().pool().clone();
    let placed = api
        .place_order(fx.buyer, request(vec![line(fx.product, fx.size_260, 3)], 400))
        .await
        .expect("Error placing order");

    let err = api
        .cancel_order(fx.other_buyer, &placed.order.order_id)
        .await
        .expect_err("Another buyer cannot cancel the order");
    assert!(matches!(err, OrderFlowError::NotOrderOwner(_)));

    // Nothing moved.
    assert_eq!(seed::stock_of(&pool, fx.product, fx.size_260).await, STOCK_PER_SIZE - 3);
    assert_eq!(seed::points_of(&pool, fx.buyer).await, BUYER_POINTS - 400);
    let stored = api
        .db()
        .fetch_order(&placed.order.order_id)
        .await
        .expect("Error fetching order")
        .expect("Order disappeared");
    assert_eq!(stored.order.status, OrderStatusType::AwaitingPayment);
    tear_down(api).await;
}

#[tokio::test]
async fn cancelling_an_unknown_order_is_not_found() {
    let (api, fx) = setup().await;
    let order_id = OrderId::from("no-such-order".to_string());
    let err = api.cancel_order(fx.buyer, &order_id).await.expect_err("No such order");
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)));
    tear_down(api).await;
}
