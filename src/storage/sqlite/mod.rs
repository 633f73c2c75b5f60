//! SQLite storage implementations
//!
//! This module provides SQLite-based implementations of all storage traits.
//! SQLite is suitable for single-instance deployments and development.

mod accounts;
mod clients;
mod resources;

use crate::config::PasswordPolicy;
use crate::errors::StorageError;
use crate::identity::types::{
    Account, AccountClaim, ApiResource, ApiScope, NewAccount, OAuthClient,
};
use crate::storage::traits::*;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

pub use accounts::SqliteAccountStore;
pub use clients::SqliteClientStore;
pub use resources::{SqliteResourceStore, SqliteScopeStore};

pub type Result<T> = std::result::Result<T, StorageError>;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        account_id TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        phone TEXT,
        password_digest TEXT NOT NULL,
        created_at TEXT NOT NULL,
        modified_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS account_claims (
        account_id TEXT NOT NULL REFERENCES accounts(id),
        claim_type TEXT NOT NULL,
        value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_account_claims_account_id
        ON account_claims(account_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_clients (
        client_id TEXT PRIMARY KEY,
        client_name TEXT NOT NULL,
        client_uri TEXT,
        secret_digest TEXT NOT NULL,
        grant_types TEXT NOT NULL,
        redirect_uris TEXT NOT NULL,
        post_logout_redirect_uris TEXT NOT NULL,
        allowed_scopes TEXT NOT NULL,
        claims TEXT NOT NULL,
        allow_offline_access INTEGER NOT NULL,
        always_include_user_claims INTEGER NOT NULL,
        access_token_lifetime INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS api_scopes (
        name TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        description TEXT NOT NULL,
        discoverable INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS api_resources (
        name TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        description TEXT NOT NULL,
        scopes TEXT NOT NULL,
        secret_digest TEXT NOT NULL,
        required_claims TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
];

/// Comprehensive SQLite credential store implementation
pub struct SqliteIdentityStorage {
    pool: SqlitePool,
    account_store: Arc<SqliteAccountStore>,
    client_store: Arc<SqliteClientStore>,
    scope_store: Arc<SqliteScopeStore>,
    resource_store: Arc<SqliteResourceStore>,
}

impl SqliteIdentityStorage {
    /// Create a new SQLite credential store instance
    pub fn new(pool: SqlitePool, password_policy: PasswordPolicy) -> Self {
        let account_store = Arc::new(SqliteAccountStore::new(pool.clone(), password_policy));
        let client_store = Arc::new(SqliteClientStore::new(pool.clone()));
        let scope_store = Arc::new(SqliteScopeStore::new(pool.clone()));
        let resource_store = Arc::new(SqliteResourceStore::new(pool.clone()));

        Self {
            pool,
            account_store,
            client_store,
            scope_store,
            resource_store,
        }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SqliteIdentityStorage {
    async fn create_account(&self, account: &NewAccount, password: &str) -> Result<Account> {
        self.account_store.create_account(account, password).await
    }

    async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.account_store.get_account_by_id(id).await
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_store.get_account_by_email(email).await
    }

    async fn get_account_by_account_id(&self, account_id: &str) -> Result<Option<Account>> {
        self.account_store
            .get_account_by_account_id(account_id)
            .await
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        self.account_store.update_account(account).await
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        self.account_store.delete_account(id).await
    }

    async fn add_account_claims(&self, account_id: &str, claims: &[AccountClaim]) -> Result<()> {
        self.account_store
            .add_account_claims(account_id, claims)
            .await
    }

    async fn get_account_claims(&self, account_id: &str) -> Result<Vec<AccountClaim>> {
        self.account_store.get_account_claims(account_id).await
    }
}

#[async_trait]
impl ClientStore for SqliteIdentityStorage {
    async fn create_clients(&self, clients: &[OAuthClient]) -> Result<u64> {
        self.client_store.create_clients(clients).await
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        self.client_store.get_client(client_id).await
    }
}

#[async_trait]
impl ScopeStore for SqliteIdentityStorage {
    async fn create_scopes(&self, scopes: &[ApiScope]) -> Result<u64> {
        self.scope_store.create_scopes(scopes).await
    }

    async fn get_scope(&self, name: &str) -> Result<Option<ApiScope>> {
        self.scope_store.get_scope(name).await
    }
}

#[async_trait]
impl ResourceStore for SqliteIdentityStorage {
    async fn create_resources(&self, resources: &[ApiResource]) -> Result<u64> {
        self.resource_store.create_resources(resources).await
    }

    async fn get_resource(&self, name: &str) -> Result<Option<ApiResource>> {
        self.resource_store.get_resource(name).await
    }
}

impl IdentityStorage for SqliteIdentityStorage {}
