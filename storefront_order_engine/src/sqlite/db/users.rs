use soe_common::Money;
use sqlx::SqliteConnection;

use crate::{db_types::User, traits::LedgerApiError};

pub(crate) async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, LedgerApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

/// Atomically takes `amount` points out of the user's balance. Same conditional-update discipline
/// as the stock decrement: the guard `points >= :a` means an overdraw matches no row and the
/// balance can never go negative, whatever else is running. Returns the remaining balance, or
/// `None` when the user is missing or the balance is short.
pub(crate) async fn debit_points(
    user_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Money>, LedgerApiError> {
    let balance: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE users
            SET points = points - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND points >= $1
            RETURNING points
        "#,
    )
    .bind(amount.value())
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(balance.map(Money::from))
}

/// Adds `amount` points back to the user's balance.
pub(crate) async fn credit_points(
    user_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Money, LedgerApiError> {
    let balance: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET points = points + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING points",
    )
    .bind(amount.value())
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    balance.map(Money::from).ok_or(LedgerApiError::UserNotFound(user_id))
}
