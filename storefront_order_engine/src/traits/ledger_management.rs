use soe_common::Money;

use crate::{db_types::User, soe_api::errors::LedgerApiError};

/// Read access to accounts and their point balances.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LedgerApiError>;

    /// The account's current point balance. Advisory only; the conditional debit inside the order
    /// transaction is what actually guards against overdraw.
    async fn fetch_point_balance(&self, user_id: i64) -> Result<Money, LedgerApiError> {
        let user = self.fetch_user(user_id).await?.ok_or(LedgerApiError::UserNotFound(user_id))?;
        Ok(user.points)
    }
}
