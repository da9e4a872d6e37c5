use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A registered account. Credentials live in their own table-facing type
/// so this one can be serialized straight into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub balance: Decimal,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Credential columns used by login and session checks
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub is_admin: bool,
}
