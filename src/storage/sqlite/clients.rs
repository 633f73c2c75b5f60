//! SQLite implementation for OAuth client storage

use crate::errors::StorageError;
use crate::identity::types::{ClientClaim, GrantType, OAuthClient};
use crate::storage::traits::{ClientStore, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of OAuth client storage
pub struct SqliteClientStore {
    pool: SqlitePool,
}

impl SqliteClientStore {
    /// Create a new SQLite client store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert GrantType enum to string representation
    fn grant_type_to_string(grant_type: &GrantType) -> &'static str {
        match grant_type {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
        }
    }

    /// Convert string to GrantType enum
    fn string_to_grant_type(s: &str) -> Result<GrantType> {
        match s {
            "authorization_code" => Ok(GrantType::AuthorizationCode),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            "refresh_token" => Ok(GrantType::RefreshToken),
            _ => Err(StorageError::InvalidData(format!(
                "Unknown grant type: {}",
                s
            ))),
        }
    }

    /// Serialize grant types to JSON string
    fn serialize_grant_types(grant_types: &[GrantType]) -> Result<String> {
        let strings: Vec<&str> = grant_types.iter().map(Self::grant_type_to_string).collect();
        serde_json::to_string(&strings)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))
    }

    /// Deserialize grant types from JSON string
    fn deserialize_grant_types(json: &str) -> Result<Vec<GrantType>> {
        let strings: Vec<String> = serde_json::from_str(json)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;
        strings
            .iter()
            .map(|s| Self::string_to_grant_type(s))
            .collect()
    }

    fn serialize_strings(values: &[String]) -> Result<String> {
        serde_json::to_string(values).map_err(|e| StorageError::SerializationFailed(e.to_string()))
    }

    fn deserialize_strings(json: &str) -> Result<Vec<String>> {
        serde_json::from_str(json).map_err(|e| StorageError::SerializationFailed(e.to_string()))
    }

    /// Convert SQLite row to OAuthClient
    fn row_to_client(row: &SqliteRow) -> Result<OAuthClient> {
        let client_id: String = row
            .try_get("client_id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get client_id: {}", e)))?;
        let client_name: String = row.try_get("client_name").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get client_name: {}", e))
        })?;
        let client_uri: Option<String> = row
            .try_get("client_uri")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get client_uri: {}", e)))?;
        let secret_digest: String = row.try_get("secret_digest").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get secret_digest: {}", e))
        })?;

        let grant_types_json: String = row.try_get("grant_types").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get grant_types: {}", e))
        })?;
        let grant_types = Self::deserialize_grant_types(&grant_types_json)?;

        let redirect_uris_json: String = row.try_get("redirect_uris").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get redirect_uris: {}", e))
        })?;
        let redirect_uris = Self::deserialize_strings(&redirect_uris_json)?;

        let post_logout_json: String = row.try_get("post_logout_redirect_uris").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get post_logout_redirect_uris: {}", e))
        })?;
        let post_logout_redirect_uris = Self::deserialize_strings(&post_logout_json)?;

        let allowed_scopes_json: String = row.try_get("allowed_scopes").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get allowed_scopes: {}", e))
        })?;
        let allowed_scopes = Self::deserialize_strings(&allowed_scopes_json)?;

        let claims_json: String = row
            .try_get("claims")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get claims: {}", e)))?;
        let claims: Vec<ClientClaim> = serde_json::from_str(&claims_json)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        let allow_offline_access: i64 = row.try_get("allow_offline_access").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get allow_offline_access: {}", e))
        })?;
        let always_include_user_claims: i64 =
            row.try_get("always_include_user_claims").map_err(|e| {
                StorageError::DatabaseError(format!(
                    "Failed to get always_include_user_claims: {}",
                    e
                ))
            })?;

        let access_token_lifetime: i64 = row.try_get("access_token_lifetime").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get access_token_lifetime: {}", e))
        })?;

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(OAuthClient {
            client_id,
            client_name,
            client_uri,
            secret_digest,
            grant_types,
            redirect_uris,
            post_logout_redirect_uris,
            allowed_scopes,
            claims,
            allow_offline_access: allow_offline_access != 0,
            always_include_user_claims: always_include_user_claims != 0,
            access_token_lifetime,
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
impl ClientStore for SqliteClientStore {
    async fn create_clients(&self, clients: &[OAuthClient]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StorageError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        let mut affected = 0u64;
        for client in clients {
            let grant_types_json = Self::serialize_grant_types(&client.grant_types)?;
            let redirect_uris_json = Self::serialize_strings(&client.redirect_uris)?;
            let post_logout_json = Self::serialize_strings(&client.post_logout_redirect_uris)?;
            let allowed_scopes_json = Self::serialize_strings(&client.allowed_scopes)?;
            let claims_json = serde_json::to_string(&client.claims)
                .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

            let result = sqlx::query(
                r#"
                INSERT INTO oauth_clients (
                    client_id, client_name, client_uri, secret_digest, grant_types,
                    redirect_uris, post_logout_redirect_uris, allowed_scopes, claims,
                    allow_offline_access, always_include_user_claims,
                    access_token_lifetime, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&client.client_id)
            .bind(&client.client_name)
            .bind(&client.client_uri)
            .bind(&client.secret_digest)
            .bind(&grant_types_json)
            .bind(&redirect_uris_json)
            .bind(&post_logout_json)
            .bind(&allowed_scopes_json)
            .bind(&claims_json)
            .bind(client.allow_offline_access as i64)
            .bind(client.always_include_user_claims as i64)
            .bind(client.access_token_lifetime)
            .bind(client.created_at.to_rfc3339())
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

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        let row = sqlx::query("SELECT * FROM oauth_clients WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get client: {}", e)))?;

        row.as_ref().map(Self::row_to_client).transpose()
    }
}
