//! SQLite implementations for API scope and API resource storage

use crate::errors::StorageError;
use crate::identity::types::{ApiResource, ApiScope};
use crate::storage::traits::{ResourceStore, Result, ScopeStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of API scope storage
pub struct SqliteScopeStore {
    pool: SqlitePool,
}

impl SqliteScopeStore {
    /// Create a new SQLite scope store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert SQLite row to ApiScope
    fn row_to_scope(row: &SqliteRow) -> Result<ApiScope> {
        let name: String = row
            .try_get("name")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get name: {}", e)))?;
        let display_name: String = row.try_get("display_name").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get display_name: {}", e))
        })?;
        let description: String = row.try_get("description").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get description: {}", e))
        })?;
        let discoverable: i64 = row.try_get("discoverable").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get discoverable: {}", e))
        })?;

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(ApiScope {
            name,
            display_name,
            description,
            discoverable: discoverable != 0,
            created_at,
        })
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
impl ScopeStore for SqliteScopeStore {
    async fn create_scopes(&self, scopes: &[ApiScope]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        let mut affected = 0u64;
        for scope in scopes {
            let result = sqlx::query(
                r#"
                INSERT INTO api_scopes (name, display_name, description, discoverable, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&scope.name)
            .bind(&scope.display_name)
            .bind(&scope.description)
            .bind(scope.discoverable as i64)
            .bind(scope.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;

            affected += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(affected)
    }

    async fn get_scope(&self, name: &str) -> Result<Option<ApiScope>> {
        let row = sqlx::query("SELECT * FROM api_scopes WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get scope: {}", e)))?;

        row.as_ref().map(Self::row_to_scope).transpose()
    }
}

/// SQLite implementation of API resource storage
pub struct SqliteResourceStore {
    pool: SqlitePool,
}

impl SqliteResourceStore {
    /// Create a new SQLite resource store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert SQLite row to ApiResource
    fn row_to_resource(row: &SqliteRow) -> Result<ApiResource> {
        let name: String = row
            .try_get("name")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get name: {}", e)))?;
        let display_name: String = row.try_get("display_name").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get display_name: {}", e))
        })?;
        let description: String = row.try_get("description").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get description: {}", e))
        })?;
        let secret_digest: String = row.try_get("secret_digest").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get secret_digest: {}", e))
        })?;

        let scopes_json: String = row
            .try_get("scopes")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get scopes: {}", e)))?;
        let scopes: Vec<String> = serde_json::from_str(&scopes_json)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        let required_claims_json: String = row.try_get("required_claims").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get required_claims: {}", e))
        })?;
        let required_claims: Vec<String> = serde_json::from_str(&required_claims_json)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(ApiResource {
            name,
            display_name,
            description,
            scopes,
            secret_digest,
            required_claims,
            created_at,
        })
    }
}

#[async_trait]
impl ResourceStore for SqliteResourceStore {
    async fn create_resources(&self, resources: &[ApiResource]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        let mut affected = 0u64;
        for resource in resources {
            let scopes_json = serde_json::to_string(&resource.scopes)
                .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;
            let required_claims_json = serde_json::to_string(&resource.required_claims)
                .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

            let result = sqlx::query(
                r#"
                INSERT INTO api_resources (
                    name, display_name, description, scopes, secret_digest,
                    required_claims, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&resource.name)
            .bind(&resource.display_name)
            .bind(&resource.description)
            .bind(&scopes_json)
            .bind(&resource.secret_digest)
            .bind(&required_claims_json)
            .bind(resource.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;

            affected += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;
        Ok(affected)
    }

    async fn get_resource(&self, name: &str) -> Result<Option<ApiResource>> {
        let row = sqlx::query("SELECT * FROM api_resources WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get resource: {}", e)))?;

        row.as_ref().map(Self::row_to_resource).transpose()
    }
}
