//! Accounts and sessions.
//!
//! Passwords are stored as HMAC-SHA256 over the password keyed by a
//! per-user random salt, hex-encoded. Sessions are opaque v4 UUID bearer
//! tokens in their own table; presenting one identifies the account until
//! logout.

use hmac::{Hmac, Mac};
use rand::Rng;
use rust_decimal::Decimal;
use sha2::Sha256;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{User, UserCredentials};
use crate::error::{PuntError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Fresh hex salt for a new account
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Hex HMAC-SHA256 of the password under the salt
pub fn hash_password(salt: &str, password: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
        .map_err(|e| PuntError::Internal(format!("HMAC init failed: {}", e)))?;
    mac.update(password.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a login attempt against the stored hash
pub fn verify_password(salt: &str, stored_hash: &str, candidate: &str) -> Result<bool> {
    let mut mac = HmacSha256::new_from_slice(salt.as_bytes())
        .map_err(|e| PuntError::Internal(format!("HMAC init failed: {}", e)))?;
    mac.update(candidate.as_bytes());

    let expected = match hex::decode(stored_hash) {
        Ok(bytes) => bytes,
        Err(_) => return Ok(false),
    };
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Create an account with the configured starting balance.
///
/// Usernames are unique; a duplicate comes back as a validation error
/// rather than a database error.
#[instrument(skip(pool, password))]
pub async fn register_user(
    pool: &PgPool,
    username: &str,
    password: &str,
    starting_balance: Decimal,
    is_admin: bool,
) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(PuntError::Validation("username must not be empty".into()));
    }
    if password.len() < 4 {
        return Err(PuntError::Validation(
            "password must be at least 4 characters".into(),
        ));
    }

    let salt = generate_salt();
    let password_hash = hash_password(&salt, password)?;

    let row = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, salt, balance, is_admin)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, created_at
        "#,
    )
    .bind(username)
    .bind(&password_hash)
    .bind(&salt)
    .bind(starting_balance)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            PuntError::Validation(format!("username {} is taken", username))
        }
        _ => PuntError::Database(e),
    })?;

    let user = User {
        id: row.get("id"),
        username: username.to_string(),
        balance: starting_balance,
        is_admin,
        created_at: row.get("created_at"),
    };
    info!(user_id = user.id, username, is_admin, "account created");
    Ok(user)
}

/// Check a username/password pair. `None` covers both an unknown username
/// and a wrong password, so callers cannot tell the two apart.
pub async fn verify_login(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<Option<UserCredentials>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, salt, is_admin
        FROM users WHERE username = $1
        "#,
    )
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let credentials = UserCredentials {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        salt: row.get("salt"),
        is_admin: row.get("is_admin"),
    };

    if verify_password(&credentials.salt, &credentials.password_hash, password)? {
        Ok(Some(credentials))
    } else {
        Ok(None)
    }
}

/// Open a session and hand back its bearer token.
pub async fn create_session(pool: &PgPool, user_id: i64) -> Result<Uuid> {
    let token = Uuid::new_v4();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Drop a session. Unknown tokens are a silent no-op.
pub async fn delete_session(pool: &PgPool, token: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve a bearer token to its account, if the session exists.
pub async fn session_user(pool: &PgPool, token: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.username, u.balance, u.is_admin, u.created_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| User {
        id: r.get("id"),
        username: r.get("username"),
        balance: r.get("balance"),
        is_admin: r.get("is_admin"),
        created_at: r.get("created_at"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let salt = generate_salt();
        let hash = hash_password(&salt, "hunter42").unwrap();

        assert!(verify_password(&salt, &hash, "hunter42").unwrap());
        assert!(!verify_password(&salt, &hash, "hunter43").unwrap());
    }

    #[test]
    fn test_same_password_different_salt_differs() {
        let hash_a = hash_password(&generate_salt(), "secret").unwrap();
        let hash_b = hash_password(&generate_salt(), "secret").unwrap();
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn test_garbage_stored_hash_is_just_a_mismatch() {
        assert!(!verify_password("abcd", "not-hex", "pw").unwrap());
    }
}
