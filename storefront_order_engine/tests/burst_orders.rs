//! Concurrency test: many simultaneous placements fighting over one stock record may never
//! oversell it. The conditional decrement makes the losers fail cleanly with InsufficientStock.
use std::sync::Arc;

use futures_util::future::join_all;
use log::*;
use soe_common::Money;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_order_engine::{
    events::EventProducers,
    order_objects::{OrderItemRequest, OrderRequest},
    OrderFlowApi,
    OrderFlowDatabase,
    OrderFlowError,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

mod support;

use support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed,
};

const STOCK: i64 = 10;
const ATTEMPTS: i64 = 20;

#[test]
fn concurrent_placements_never_oversell() {
    let sys = Runtime::new().unwrap();

    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let pool = db.pool().clone();

        let seller = seed::create_user(&pool, "sun-hee", "Seller", 0).await;
        let store = seed::create_store(&pool, seller, "Laced Up").await;
        let product = seed::create_product(&pool, store, "Canvas high-top", 1_000).await;
        let size = seed::create_size(&pool, "270").await;
        seed::set_stock(&pool, product, size, STOCK).await;
        let mut buyers = Vec::with_capacity(ATTEMPTS as usize);
        for i in 0..ATTEMPTS {
            buyers.push(seed::create_user(&pool, &format!("buyer-{i}"), "Buyer", 0).await);
        }

        let api = Arc::new(OrderFlowApi::new(db.clone(), EventProducers::default()));
        info!("🚀️ Injecting {ATTEMPTS} concurrent orders against {STOCK} units of stock");
        let tasks = buyers.into_iter().map(|buyer| {
            let api = Arc::clone(&api);
            tokio::spawn(async move {
                let request = OrderRequest {
                    recipient: "Burst Buyer".to_string(),
                    phone: "010-0000-0000".to_string(),
                    address: "1 Teheran-ro, Seoul".to_string(),
                    items: vec![OrderItemRequest { product_id: product, size_id: size, quantity: 1 }],
                    use_points: Money::zero(),
                };
                api.place_order(buyer, request).await
            })
        });
        let results = join_all(tasks).await;

        let mut successes = 0_i64;
        for result in results {
            match result.expect("Placement task panicked") {
                Ok(_) => successes += 1,
                Err(OrderFlowError::InsufficientStock { .. }) => {},
                Err(e) => panic!("Unexpected placement error: {e}"),
            }
        }
        assert_eq!(successes, STOCK, "exactly the available stock must have been sold");
        assert_eq!(seed::stock_of(&pool, product, size).await, 0);
        assert_eq!(seed::order_count(&pool).await, STOCK);

        let mut db = db;
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        Sqlite::drop_database(&url).await.unwrap();
    });
    info!("🚀️ test complete");
}
