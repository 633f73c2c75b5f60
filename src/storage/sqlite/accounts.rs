//! SQLite implementation for account and account-claim storage

use crate::config::PasswordPolicy;
use crate::errors::StorageError;
use crate::identity::secrets::{SecretHasher, Sha256SecretHasher};
use crate::identity::types::{Account, AccountClaim, NewAccount};
use crate::storage::traits::{AccountStore, Result};
use crate::storage::validation::validate_new_account;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of account storage
pub struct SqliteAccountStore {
    pool: SqlitePool,
    password_policy: PasswordPolicy,
    hasher: Sha256SecretHasher,
}

impl SqliteAccountStore {
    /// Create a new SQLite account store
    pub fn new(pool: SqlitePool, password_policy: PasswordPolicy) -> Self {
        Self {
            pool,
            password_policy,
            hasher: Sha256SecretHasher,
        }
    }

    /// Convert SQLite row to Account
    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get id: {}", e)))?;
        let account_id: String = row
            .try_get("account_id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get account_id: {}", e)))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get email: {}", e)))?;
        let first_name: String = row
            .try_get("first_name")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get first_name: {}", e)))?;
        let last_name: String = row
            .try_get("last_name")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get last_name: {}", e)))?;
        let phone: Option<String> = row
            .try_get("phone")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get phone: {}", e)))?;

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        let modified_at_str: String = row.try_get("modified_at").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get modified_at: {}", e))
        })?;
        let modified_at = chrono::DateTime::parse_from_rfc3339(&modified_at_str)
            .map_err(|e| {
                StorageError::InvalidData(format!("Invalid modified_at timestamp: {}", e))
            })?
            .with_timezone(&Utc);

        Ok(Account {
            id,
            account_id,
            email,
            first_name,
            last_name,
            phone,
            created_at,
            modified_at,
        })
    }

    async fn get_account_by_column(&self, column: &str, value: &str) -> Result<Option<Account>> {
        let query = format!(
            "SELECT id, account_id, email, first_name, last_name, phone, created_at, modified_at \
             FROM accounts WHERE {} = ?",
            column
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(Self::row_to_account).transpose()
    }
}

fn map_insert_error(e: sqlx::Error) -> StorageError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint") {
        StorageError::Conflict(message)
    } else {
        StorageError::DatabaseError(message)
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create_account(&self, account: &NewAccount, password: &str) -> Result<Account> {
        let errors = validate_new_account(account, password, &self.password_policy);
        if !errors.is_empty() {
            return Err(StorageError::RejectedEntity(errors.join("; ")));
        }

        let now = Utc::now();
        let created = Account {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            phone: account.phone.clone(),
            created_at: now,
            modified_at: now,
        };
        let password_digest = self.hasher.hash(password);

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, account_id, email, first_name, last_name, phone,
                password_digest, created_at, modified_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&created.id)
        .bind(&created.account_id)
        .bind(&created.email)
        .bind(&created.first_name)
        .bind(&created.last_name)
        .bind(&created.phone)
        .bind(&password_digest)
        .bind(created.created_at.to_rfc3339())
        .bind(created.modified_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(created)
    }

    async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.get_account_by_column("id", id).await
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.get_account_by_column("email", email).await
    }

    async fn get_account_by_account_id(&self, account_id: &str) -> Result<Option<Account>> {
        self.get_account_by_column("account_id", account_id).await
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        let existing = self
            .get_account_by_id(&account.id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Account {}", account.id)))?;

        // Last-modified strictly increases even when the clock has not
        // advanced since the previous write.
        let now = Utc::now();
        let modified_at = if now > existing.modified_at {
            now
        } else {
            existing.modified_at + chrono::Duration::microseconds(1)
        };

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = ?, first_name = ?, last_name = ?, phone = ?, modified_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone)
        .bind(modified_at.to_rfc3339())
        .bind(&account.id)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Account {}", account.id)));
        }
        Ok(())
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM account_claims WHERE account_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Failed to delete claims: {}", e)))?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Failed to delete account: {}", e)))?;

        tx.commit().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }

    async fn add_account_claims(&self, account_id: &str, claims: &[AccountClaim]) -> Result<()> {
        if self.get_account_by_id(account_id).await?.is_none() {
            return Err(StorageError::NotFound(format!("Account {}", account_id)));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        for claim in claims {
            sqlx::query(
                "INSERT INTO account_claims (account_id, claim_type, value) VALUES (?, ?, ?)",
            )
            .bind(account_id)
            .bind(&claim.claim_type)
            .bind(&claim.value)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;
        }

        tx.commit().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(())
    }

    async fn get_account_claims(&self, account_id: &str) -> Result<Vec<AccountClaim>> {
        let rows = sqlx::query(
            "SELECT claim_type, value FROM account_claims WHERE account_id = ? ORDER BY claim_type",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(format!("Failed to get claims: {}", e)))?;

        rows.iter()
            .map(|row| {
                let claim_type: String = row.try_get("claim_type").map_err(|e| {
                    StorageError::DatabaseError(format!("Failed to get claim_type: {}", e))
                })?;
                let value: String = row.try_get("value").map_err(|e| {
                    StorageError::DatabaseError(format!("Failed to get value: {}", e))
                })?;
                Ok(AccountClaim { claim_type, value })
            })
            .collect()
    }
}
