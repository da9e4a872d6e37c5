//! The two-operation balance ledger.
//!
//! Every balance mutation in the system goes through `debit` or `credit`,
//! always inside a caller-owned transaction. Both lock the balance row and
//! hold the lock across the check and the write, so a concurrent mutation
//! can never see a stale balance.

use rust_decimal::Decimal;
use sqlx::{PgConnection, Row};
use tracing::debug;

use crate::error::{Result, WagerError};
use crate::engine::odds;

/// Reject non-positive or sub-cent amounts. Runs before any lock.
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if odds::is_valid_amount(amount) {
        Ok(())
    } else {
        Err(WagerError::InvalidAmount { amount }.into())
    }
}

/// Take `amount` from the user's balance. Fails with `InsufficientFunds`
/// when the locked balance is smaller than the amount.
pub async fn debit(conn: &mut PgConnection, user_id: i64, amount: Decimal) -> Result<Decimal> {
    validate_amount(amount)?;

    let balance = lock_balance(conn, user_id).await?;
    if balance < amount {
        return Err(WagerError::InsufficientFunds {
            required: amount,
            available: balance,
        }
        .into());
    }

    let new_balance = balance - amount;
    write_balance(conn, user_id, new_balance).await?;
    debug!(user_id, %amount, %new_balance, "debit applied");
    Ok(new_balance)
}

/// Add `amount` to the user's balance. Never fails for a valid amount and
/// an existing user.
pub async fn credit(conn: &mut PgConnection, user_id: i64, amount: Decimal) -> Result<Decimal> {
    validate_amount(amount)?;

    let balance = lock_balance(conn, user_id).await?;
    let new_balance = balance + amount;
    write_balance(conn, user_id, new_balance).await?;
    debug!(user_id, %amount, %new_balance, "credit applied");
    Ok(new_balance)
}

async fn lock_balance(conn: &mut PgConnection, user_id: i64) -> Result<Decimal> {
    let row = sqlx::query("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(row.get("balance")),
        None => Err(WagerError::UserNotFound { user_id }.into()),
    }
}

async fn write_balance(conn: &mut PgConnection, user_id: i64, balance: Decimal) -> Result<()> {
    sqlx::query("UPDATE users SET balance = $1 WHERE id = $2")
        .bind(balance)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(dec!(0.01)).is_ok());
        assert!(validate_amount(dec!(1000)).is_ok());
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-10)).is_err());
        assert!(validate_amount(dec!(1.005)).is_err());
    }
}
