//! Fixture helpers for the integration tests. Everything here writes through the pool directly;
//! the engine under test only ever sees the resulting rows.
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// The standard storefront: one seller with one store, two enabled buyers, one product in two
/// sizes with 10 units of stock each.
pub struct Fixtures {
    pub seller: i64,
    pub buyer: i64,
    pub other_buyer: i64,
    pub store: i64,
    pub product: i64,
    pub size_260: i64,
    pub size_270: i64,
}

pub const BUYER_POINTS: i64 = 5_000;
pub const PRODUCT_PRICE: i64 = 1_000;
pub const STOCK_PER_SIZE: i64 = 10;

pub async fn storefront_fixtures(pool: &SqlitePool) -> Fixtures {
    let seller = create_user(pool, "sun-hee", "Seller", 0).await;
    let buyer = create_user(pool, "alice", "Buyer", BUYER_POINTS).await;
    let other_buyer = create_user(pool, "bob", "Buyer", BUYER_POINTS).await;
    let store = create_store(pool, seller, "Laced Up").await;
    let product = create_product(pool, store, "Canvas high-top", PRODUCT_PRICE).await;
    let size_260 = create_size(pool, "260").await;
    let size_270 = create_size(pool, "270").await;
    set_stock(pool, product, size_260, STOCK_PER_SIZE).await;
    set_stock(pool, product, size_270, STOCK_PER_SIZE).await;
    Fixtures { seller, buyer, other_buyer, store, product, size_260, size_270 }
}

pub async fn create_user(pool: &SqlitePool, nickname: &str, role: &str, points: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO users (nickname, role, points) VALUES ($1, $2, $3) RETURNING id")
        .bind(nickname)
        .bind(role)
        .bind(points)
        .fetch_one(pool)
        .await
        .expect("Error creating user")
}

pub async fn disable_user(pool: &SqlitePool, user_id: i64) {
    sqlx::query("UPDATE users SET enabled = 0 WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Error disabling user");
}

pub async fn create_store(pool: &SqlitePool, seller_id: i64, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO stores (seller_id, name) VALUES ($1, $2) RETURNING id")
        .bind(seller_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Error creating store")
}

pub async fn create_product(pool: &SqlitePool, store_id: i64, name: &str, price: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO products (store_id, name, price) VALUES ($1, $2, $3) RETURNING id")
        .bind(store_id)
        .bind(name)
        .bind(price)
        .fetch_one(pool)
        .await
        .expect("Error creating product")
}

pub async fn set_discount(
    pool: &SqlitePool,
    product_id: i64,
    discount_price: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) {
    sqlx::query(
        "UPDATE products SET discount_price = $1, discount_start_time = $2, discount_end_time = $3 WHERE id = $4",
    )
    .bind(discount_price)
    .bind(start)
    .bind(end)
    .bind(product_id)
    .execute(pool)
    .await
    .expect("Error setting discount");
}

pub async fn reprice_product(pool: &SqlitePool, product_id: i64, price: i64) {
    sqlx::query(
        "UPDATE products SET price = $1, discount_price = NULL, discount_start_time = NULL, discount_end_time = NULL \
         WHERE id = $2",
    )
    .bind(price)
    .bind(product_id)
    .execute(pool)
    .await
    .expect("Error repricing product");
}

pub async fn create_size(pool: &SqlitePool, label: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO sizes (label) VALUES ($1) RETURNING id")
        .bind(label)
        .fetch_one(pool)
        .await
        .expect("Error creating size")
}

pub async fn set_stock(pool: &SqlitePool, product_id: i64, size_id: i64, quantity: i64) {
    sqlx::query(
        "INSERT INTO stocks (product_id, size_id, quantity) VALUES ($1, $2, $3) ON CONFLICT (product_id, size_id) DO \
         UPDATE SET quantity = excluded.quantity",
    )
    .bind(product_id)
    .bind(size_id)
    .bind(quantity)
    .execute(pool)
    .await
    .expect("Error setting stock");
}

pub async fn add_cart_item(pool: &SqlitePool, user_id: i64, product_id: i64, size_id: i64, quantity: i64) {
    sqlx::query("INSERT INTO cart_items (user_id, product_id, size_id, quantity) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(product_id)
        .bind(size_id)
        .bind(quantity)
        .execute(pool)
        .await
        .expect("Error adding cart item");
}

// ------------------------------------ state snapshots for assertions ------------------------------------

pub async fn stock_of(pool: &SqlitePool, product_id: i64, size_id: i64) -> i64 {
    sqlx::query_scalar("SELECT quantity FROM stocks WHERE product_id = $1 AND size_id = $2")
        .bind(product_id)
        .bind(size_id)
        .fetch_one(pool)
        .await
        .expect("Error reading stock")
}

pub async fn points_of(pool: &SqlitePool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT points FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("Error reading points")
}

pub async fn order_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(pool).await.expect("Error counting orders")
}

pub async fn order_item_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM order_items").fetch_one(pool).await.expect("Error counting order items")
}
