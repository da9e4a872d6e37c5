//! Wallet transactions: deposits, withdrawals and transfers.
//!
//! Requests only record intent; no balance check happens at request time,
//! so a withdrawal larger than the current balance sits PENDING until an
//! admin decides it. Balances move exactly once, on approval, and a failed
//! approval leaves the request PENDING for another attempt.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use tracing::{info, instrument};

use crate::domain::{Transaction, TransactionKind, TransactionStatus};
use crate::engine::{ledger, Engine};
use crate::error::{PuntError, Result, WagerError};

/// Outcome of an admin decision on a pending transaction
#[derive(Debug, Clone)]
pub struct ApprovalReceipt {
    pub transaction: Transaction,
}

impl Engine {
    /// Record a deposit request. The credit happens at approval.
    #[instrument(skip(self))]
    pub async fn request_deposit(&self, user_id: i64, amount: Decimal) -> Result<Transaction> {
        self.insert_request(user_id, TransactionKind::Deposit, amount, None, self.rules().min_deposit)
            .await
    }

    /// Record a withdrawal request. The balance is not checked here; an
    /// oversized request is a legal PENDING row that fails at approval.
    #[instrument(skip(self))]
    pub async fn request_withdrawal(&self, user_id: i64, amount: Decimal) -> Result<Transaction> {
        self.insert_request(
            user_id,
            TransactionKind::Withdrawal,
            amount,
            None,
            self.rules().min_withdrawal,
        )
        .await
    }

    /// Record a transfer request to another account. Outgoing money, so
    /// the withdrawal minimum applies.
    #[instrument(skip(self))]
    pub async fn request_transfer(
        &self,
        user_id: i64,
        to_user_id: i64,
        amount: Decimal,
    ) -> Result<Transaction> {
        if to_user_id == user_id {
            return Err(PuntError::Validation(
                "transfer counterparty must be a different account".into(),
            ));
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(to_user_id)
            .fetch_optional(self.pool())
            .await?;
        if exists.is_none() {
            return Err(WagerError::UserNotFound { user_id: to_user_id }.into());
        }

        self.insert_request(
            user_id,
            TransactionKind::Transfer,
            amount,
            Some(to_user_id),
            self.rules().min_withdrawal,
        )
        .await
    }

    async fn insert_request(
        &self,
        user_id: i64,
        kind: TransactionKind,
        amount: Decimal,
        counterparty_id: Option<i64>,
        minimum: Decimal,
    ) -> Result<Transaction> {
        ledger::validate_amount(amount)?;
        if amount < minimum {
            return Err(WagerError::BelowMinimum { amount, minimum }.into());
        }

        let row = sqlx::query(
            r#"
            INSERT INTO transactions (user_id, kind, amount, counterparty_id, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            RETURNING id, requested_at
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(amount)
        .bind(counterparty_id)
        .fetch_one(self.pool())
        .await?;

        let tx_id: i64 = row.get("id");
        info!(user_id, tx_id, %kind, %amount, "transaction requested");

        Ok(Transaction {
            id: tx_id,
            user_id,
            kind,
            amount,
            counterparty_id,
            status: TransactionStatus::Pending,
            requested_at: row.get("requested_at"),
            processed_at: None,
            processed_by: None,
        })
    }

    /// Approve a pending transaction and move the money.
    ///
    /// The transaction row lock makes the decision exclusive; the balance
    /// mutation inside the same database transaction makes it atomic. A
    /// withdrawal or transfer whose debit fails rolls the whole approval
    /// back, and the row stays PENDING.
    #[instrument(skip(self))]
    pub async fn approve_transaction(&self, admin_id: i64, tx_id: i64) -> Result<ApprovalReceipt> {
        let mut db_tx = self.pool().begin().await?;

        let row = sqlx::query(
            r#"
            SELECT user_id, kind, amount, counterparty_id, status, requested_at
            FROM transactions WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(tx_id)
        .fetch_optional(&mut *db_tx)
        .await?;
        let row = match row {
            Some(row) => row,
            None => return Err(WagerError::TransactionNotFound { tx_id }.into()),
        };

        let status: String = row.get("status");
        if status != TransactionStatus::Pending.as_str() {
            return Err(WagerError::AlreadyProcessed { tx_id }.into());
        }

        let user_id: i64 = row.get("user_id");
        let kind_str: String = row.get("kind");
        let kind = TransactionKind::try_from(kind_str.as_str()).map_err(PuntError::Internal)?;
        let amount: Decimal = row.get("amount");
        let counterparty_id: Option<i64> = row.get("counterparty_id");

        match kind {
            TransactionKind::Deposit => {
                ledger::credit(&mut *db_tx, user_id, amount).await?;
            }
            TransactionKind::Withdrawal => {
                ledger::debit(&mut *db_tx, user_id, amount).await?;
            }
            TransactionKind::Transfer => {
                let to_user_id = counterparty_id.ok_or_else(|| {
                    PuntError::Internal(format!("transfer {} has no counterparty", tx_id))
                })?;
                ledger::debit(&mut *db_tx, user_id, amount).await?;
                ledger::credit(&mut *db_tx, to_user_id, amount).await?;
            }
        }

        let processed_at = self.mark_processed(&mut db_tx, tx_id, TransactionStatus::Approved, admin_id).await?;

        db_tx.commit().await?;
        info!(tx_id, admin_id, %kind, %amount, "transaction approved");

        Ok(ApprovalReceipt {
            transaction: Transaction {
                id: tx_id,
                user_id,
                kind,
                amount,
                counterparty_id,
                status: TransactionStatus::Approved,
                requested_at: row.get("requested_at"),
                processed_at: Some(processed_at),
                processed_by: Some(admin_id),
            },
        })
    }

    /// Reject a pending transaction. No balance changes.
    #[instrument(skip(self))]
    pub async fn reject_transaction(&self, admin_id: i64, tx_id: i64) -> Result<ApprovalReceipt> {
        let mut db_tx = self.pool().begin().await?;

        let row = sqlx::query(
            r#"
            SELECT user_id, kind, amount, counterparty_id, status, requested_at
            FROM transactions WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(tx_id)
        .fetch_optional(&mut *db_tx)
        .await?;
        let row = match row {
            Some(row) => row,
            None => return Err(WagerError::TransactionNotFound { tx_id }.into()),
        };

        let status: String = row.get("status");
        if status != TransactionStatus::Pending.as_str() {
            return Err(WagerError::AlreadyProcessed { tx_id }.into());
        }

        let kind_str: String = row.get("kind");
        let kind = TransactionKind::try_from(kind_str.as_str()).map_err(PuntError::Internal)?;

        let processed_at = self.mark_processed(&mut db_tx, tx_id, TransactionStatus::Rejected, admin_id).await?;

        db_tx.commit().await?;
        info!(tx_id, admin_id, "transaction rejected");

        Ok(ApprovalReceipt {
            transaction: Transaction {
                id: tx_id,
                user_id: row.get("user_id"),
                kind,
                amount: row.get("amount"),
                counterparty_id: row.get("counterparty_id"),
                status: TransactionStatus::Rejected,
                requested_at: row.get("requested_at"),
                processed_at: Some(processed_at),
                processed_by: Some(admin_id),
            },
        })
    }

    async fn mark_processed(
        &self,
        db_tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tx_id: i64,
        status: TransactionStatus,
        admin_id: i64,
    ) -> Result<DateTime<Utc>> {
        let row = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, processed_at = NOW(), processed_by = $2
            WHERE id = $3
            RETURNING processed_at
            "#,
        )
        .bind(status.as_str())
        .bind(admin_id)
        .bind(tx_id)
        .fetch_one(&mut **db_tx)
        .await?;

        Ok(row.get("processed_at"))
    }
}
