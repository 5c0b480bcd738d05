//! # User Repository (Identity Store)
//!
//! User records and PIN verification.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator types PIN "1234"                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  hash_pin("1234") → "03ac6742...46f4"   (hashed exactly once)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... FROM users WHERE pin_hash = ?1                             │
//! │       │                                                                 │
//! │       ├── row      → Some(User)  → LoginResponse { success: true }     │
//! │       └── no row   → None        → LoginResponse { "Invalid PIN" }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No lockout, throttling or second factor: this is counter convenience,
//! not high-assurance authentication.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use stockroom_core::auth::hash_pin;
use stockroom_core::validation::{validate_name, validate_pin};
use stockroom_core::{Role, User};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{DbError, DbResult};

/// Result of a login attempt, shaped for a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl LoginResponse {
    fn accepted(user: User) -> Self {
        LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            user_id: Some(user.id),
            name: Some(user.name),
            role: Some(user.role),
        }
    }

    fn rejected(message: &str) -> Self {
        LoginResponse {
            success: false,
            message: message.to_string(),
            user_id: None,
            name: None,
            role: None,
        }
    }
}

/// Repository for user records.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl UserRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        UserRepository { pool, write_gate }
    }

    /// Gets a user by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No such user
    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, pin_hash, role, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Finds the user whose stored digest equals the digest of `raw_pin`.
    ///
    /// A non-matching PIN is `Ok(None)`, not an error.
    pub async fn authenticate(&self, raw_pin: &str) -> DbResult<Option<User>> {
        let pin_hash = hash_pin(raw_pin);

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, pin_hash, role, created_at
            FROM users
            WHERE pin_hash = ?1
            "#,
        )
        .bind(&pin_hash)
        .fetch_optional(&self.pool)
        .await?;

        debug!(matched = user.is_some(), "PIN check");
        Ok(user)
    }

    /// Caller-facing login. Storage faults are logged and reported as a
    /// generic failure rather than returned.
    pub async fn login(&self, raw_pin: &str) -> LoginResponse {
        match self.authenticate(raw_pin).await {
            Ok(Some(user)) => {
                info!(user_id = user.id, role = %user.role, "User logged in");
                LoginResponse::accepted(user)
            }
            Ok(None) => LoginResponse::rejected("Invalid PIN"),
            Err(e) => {
                error!(error = %e, "Error validating PIN");
                LoginResponse::rejected("Authentication error")
            }
        }
    }

    /// Creates a user. The role is fixed from here on.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - another user already has this PIN
    pub async fn create_user(&self, name: &str, raw_pin: &str, role: Role) -> DbResult<User> {
        validate_name("name", name)?;
        validate_pin(raw_pin)?;

        let name = name.trim().to_string();
        let pin_hash = hash_pin(raw_pin);
        let now = Utc::now();

        let _gate = self.write_gate.lock().await;
        let result = sqlx::query(
            "INSERT INTO users (name, pin_hash, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&name)
        .bind(&pin_hash)
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(hide_pin)?;

        let user = User {
            id: result.last_insert_rowid(),
            name,
            pin_hash,
            role,
            created_at: now,
        };

        info!(user_id = user.id, role = %role, "User created");
        Ok(user)
    }

    /// Replaces a user's PIN. This is how the bootstrap PIN gets rotated.
    pub async fn change_pin(&self, user_id: i64, raw_pin: &str) -> DbResult<()> {
        validate_pin(raw_pin)?;

        let _gate = self.write_gate.lock().await;
        let result = sqlx::query("UPDATE users SET pin_hash = ?2 WHERE id = ?1")
            .bind(user_id)
            .bind(hash_pin(raw_pin))
            .execute(&self.pool)
            .await
            .map_err(hide_pin)?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        info!(user_id, "PIN changed");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Maps a pin_hash unique violation to an error that doesn't echo the hash.
fn hide_pin(err: sqlx::Error) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("pin", "****"),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use stockroom_core::auth::BOOTSTRAP_PIN;

    #[tokio::test]
    async fn test_authenticate_matches_only_the_right_pin() {
        let db = fixtures::db().await;
        let users = db.users();
        let dana = users.create_user("Dana", "5678", Role::Operator).await.unwrap();

        let found = users.authenticate("5678").await.unwrap().unwrap();
        assert_eq!(found, dana);

        let digest = hash_pin("5678");
        for wrong in ["", "5679", "56780", "0000", digest.as_str()] {
            assert!(users.authenticate(wrong).await.unwrap().is_none(), "{wrong} matched");
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let db = fixtures::db().await;
        let users = db.users();
        let dana = users.create_user("Dana", "5678", Role::Operator).await.unwrap();

        assert_eq!(users.find_by_id(dana.id).await.unwrap(), Some(dana));
        assert_eq!(users.find_by_id(9_999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_pin_is_rejected() {
        let db = fixtures::db().await;
        let err = db
            .users()
            .create_user("Eve", BOOTSTRAP_PIN, Role::Operator)
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "pin");
                assert_eq!(value, "****");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_pin_is_rejected_before_insert() {
        let db = fixtures::db().await;
        let err = db.users().create_user("Eve", "12", Role::Operator).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(_)));
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_change_pin_rotates_bootstrap_credential() {
        let db = fixtures::db().await;
        let users = db.users();
        let admin = users.authenticate(BOOTSTRAP_PIN).await.unwrap().unwrap();

        users.change_pin(admin.id, "86420").await.unwrap();

        assert!(users.authenticate(BOOTSTRAP_PIN).await.unwrap().is_none());
        let again = users.authenticate("86420").await.unwrap().unwrap();
        assert_eq!(again.id, admin.id);
        assert_eq!(again.role, Role::Admin);

        assert!(matches!(
            users.change_pin(9_999, "1111").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_responses() {
        let db = fixtures::db().await;
        let users = db.users();

        let ok = users.login(BOOTSTRAP_PIN).await;
        assert!(ok.success);
        assert_eq!(ok.message, "Login successful");
        assert_eq!(ok.role, Some(Role::Admin));

        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["userId"], 1);
        assert_eq!(json["name"], "Admin");
        assert_eq!(json["role"], "admin");

        let bad = users.login("0000").await;
        assert_eq!(bad, LoginResponse::rejected("Invalid PIN"));
        let json = serde_json::to_value(&bad).unwrap();
        assert!(json.get("userId").is_none());

        db.close().await;
        let down = users.login(BOOTSTRAP_PIN).await;
        assert!(!down.success);
        assert_eq!(down.message, "Authentication error");
    }
}
