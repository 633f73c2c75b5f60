//! In-memory implementation of the credential store traits.

use crate::config::PasswordPolicy;
use crate::errors::StorageError;
use crate::identity::secrets::{SecretHasher, Sha256SecretHasher};
use crate::identity::types::{
    Account, AccountClaim, ApiResource, ApiScope, NewAccount, OAuthClient,
};
use crate::storage::traits::*;
use crate::storage::validation::validate_new_account;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

pub type Result<T> = std::result::Result<T, StorageError>;

/// In-memory credential store
pub struct MemoryIdentityStorage {
    accounts: Mutex<HashMap<String, Account>>, // id -> account
    credentials: Mutex<HashMap<String, String>>, // id -> password digest
    account_claims: Mutex<HashMap<String, Vec<AccountClaim>>>, // id -> claims
    clients: Mutex<HashMap<String, OAuthClient>>,
    scopes: Mutex<HashMap<String, ApiScope>>,
    resources: Mutex<HashMap<String, ApiResource>>,
    password_policy: PasswordPolicy,
    hasher: Sha256SecretHasher,
}

impl MemoryIdentityStorage {
    pub fn new(password_policy: PasswordPolicy) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            credentials: Mutex::new(HashMap::new()),
            account_claims: Mutex::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
            scopes: Mutex::new(HashMap::new()),
            resources: Mutex::new(HashMap::new()),
            password_policy,
            hasher: Sha256SecretHasher,
        }
    }
}

impl Default for MemoryIdentityStorage {
    fn default() -> Self {
        Self::new(PasswordPolicy::default())
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::SerializationFailed(format!("Lock error: {}", e))
}

#[async_trait]
impl AccountStore for MemoryIdentityStorage {
    async fn create_account(&self, account: &NewAccount, password: &str) -> Result<Account> {
        let errors = validate_new_account(account, password, &self.password_policy);
        if !errors.is_empty() {
            return Err(StorageError::RejectedEntity(errors.join("; ")));
        }

        let mut accounts = self.accounts.lock().map_err(lock_error)?;

        // Unique indexes on email and account id.
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StorageError::Conflict(format!(
                "An account with email '{}' already exists",
                account.email
            )));
        }
        if accounts
            .values()
            .any(|a| a.account_id == account.account_id)
        {
            return Err(StorageError::Conflict(format!(
                "An account with account id '{}' already exists",
                account.account_id
            )));
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

        let mut credentials = self.credentials.lock().map_err(lock_error)?;
        credentials.insert(created.id.clone(), self.hasher.hash(password));
        accounts.insert(created.id.clone(), created.clone());

        Ok(created)
    }

    async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().map_err(lock_error)?;
        Ok(accounts.get(id).cloned())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().map_err(lock_error)?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn get_account_by_account_id(&self, account_id: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().map_err(lock_error)?;
        Ok(accounts
            .values()
            .find(|a| a.account_id == account_id)
            .cloned())
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        let mut accounts = self.accounts.lock().map_err(lock_error)?;
        if !accounts.contains_key(&account.id) {
            return Err(StorageError::NotFound(format!("Account {}", account.id)));
        }

        // The unique index on email holds across updates too.
        if accounts
            .values()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(StorageError::Conflict(format!(
                "An account with email '{}' already exists",
                account.email
            )));
        }

        let existing = accounts
            .get(&account.id)
            .ok_or_else(|| StorageError::NotFound(format!("Account {}", account.id)))?;

        let mut updated = account.clone();
        // Creation timestamp and account id are immutable; last-modified
        // strictly increases even when the clock has not advanced.
        updated.created_at = existing.created_at;
        updated.account_id = existing.account_id.clone();
        let now = Utc::now();
        updated.modified_at = if now > existing.modified_at {
            now
        } else {
            existing.modified_at + chrono::Duration::microseconds(1)
        };

        accounts.insert(updated.id.clone(), updated);
        Ok(())
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        let mut accounts = self.accounts.lock().map_err(lock_error)?;
        accounts.remove(id);

        let mut credentials = self.credentials.lock().map_err(lock_error)?;
        credentials.remove(id);

        let mut claims = self.account_claims.lock().map_err(lock_error)?;
        claims.remove(id);

        Ok(())
    }

    async fn add_account_claims(&self, account_id: &str, claims: &[AccountClaim]) -> Result<()> {
        let accounts = self.accounts.lock().map_err(lock_error)?;
        if !accounts.contains_key(account_id) {
            return Err(StorageError::NotFound(format!("Account {}", account_id)));
        }
        drop(accounts);

        let mut account_claims = self.account_claims.lock().map_err(lock_error)?;
        account_claims
            .entry(account_id.to_string())
            .or_default()
            .extend_from_slice(claims);
        Ok(())
    }

    async fn get_account_claims(&self, account_id: &str) -> Result<Vec<AccountClaim>> {
        let account_claims = self.account_claims.lock().map_err(lock_error)?;
        Ok(account_claims.get(account_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ClientStore for MemoryIdentityStorage {
    async fn create_clients(&self, clients: &[OAuthClient]) -> Result<u64> {
        let mut stored = self.clients.lock().map_err(lock_error)?;

        // Check the whole batch, including duplicates within the batch
        // itself, before inserting anything so a conflict commits nothing.
        for (i, client) in clients.iter().enumerate() {
            if stored.contains_key(&client.client_id)
                || clients[..i]
                    .iter()
                    .any(|c| c.client_id == client.client_id)
            {
                return Err(StorageError::Conflict(format!(
                    "A client with id '{}' already exists",
                    client.client_id
                )));
            }
        }

        for client in clients {
            stored.insert(client.client_id.clone(), client.clone());
        }
        Ok(clients.len() as u64)
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        let clients = self.clients.lock().map_err(lock_error)?;
        Ok(clients.get(client_id).cloned())
    }
}

#[async_trait]
impl ScopeStore for MemoryIdentityStorage {
    async fn create_scopes(&self, scopes: &[ApiScope]) -> Result<u64> {
        let mut stored = self.scopes.lock().map_err(lock_error)?;

        for (i, scope) in scopes.iter().enumerate() {
            if stored.contains_key(&scope.name)
                || scopes[..i].iter().any(|s| s.name == scope.name)
            {
                return Err(StorageError::Conflict(format!(
                    "A scope named '{}' already exists",
                    scope.name
                )));
            }
        }

        for scope in scopes {
            stored.insert(scope.name.clone(), scope.clone());
        }
        Ok(scopes.len() as u64)
    }

    async fn get_scope(&self, name: &str) -> Result<Option<ApiScope>> {
        let scopes = self.scopes.lock().map_err(lock_error)?;
        Ok(scopes.get(name).cloned())
    }
}

#[async_trait]
impl ResourceStore for MemoryIdentityStorage {
    async fn create_resources(&self, resources: &[ApiResource]) -> Result<u64> {
        let mut stored = self.resources.lock().map_err(lock_error)?;

        for (i, resource) in resources.iter().enumerate() {
            if stored.contains_key(&resource.name)
                || resources[..i].iter().any(|r| r.name == resource.name)
            {
                return Err(StorageError::Conflict(format!(
                    "A resource named '{}' already exists",
                    resource.name
                )));
            }
        }

        for resource in resources {
            stored.insert(resource.name.clone(), resource.clone());
        }
        Ok(resources.len() as u64)
    }

    async fn get_resource(&self, name: &str) -> Result<Option<ApiResource>> {
        let resources = self.resources.lock().map_err(lock_error)?;
        Ok(resources.get(name).cloned())
    }
}

impl IdentityStorage for MemoryIdentityStorage {}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str, account_id: &str) -> NewAccount {
        NewAccount {
            account_id: account_id.to_string(),
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_create_account_sets_timestamps_once() {
        let storage = MemoryIdentityStorage::default();
        let account = storage
            .create_account(&new_account("a@x.com", "AAAAAA"), "Passw0rd")
            .await
            .unwrap();
        assert_eq!(account.created_at, account.modified_at);
        assert!(!account.id.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let storage = MemoryIdentityStorage::default();
        storage
            .create_account(&new_account("a@x.com", "AAAAAA"), "Passw0rd")
            .await
            .unwrap();

        let result = storage
            .create_account(&new_account("a@x.com", "BBBBBB"), "Passw0rd")
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_account_id_conflicts() {
        let storage = MemoryIdentityStorage::default();
        storage
            .create_account(&new_account("a@x.com", "AAAAAA"), "Passw0rd")
            .await
            .unwrap();

        let result = storage
            .create_account(&new_account("b@x.com", "AAAAAA"), "Passw0rd")
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_refreshes_modified_at_strictly() {
        let storage = MemoryIdentityStorage::default();
        let account = storage
            .create_account(&new_account("a@x.com", "AAAAAA"), "Passw0rd")
            .await
            .unwrap();

        storage.update_account(&account).await.unwrap();
        let first = storage
            .get_account_by_id(&account.id)
            .await
            .unwrap()
            .unwrap();
        assert!(first.modified_at > account.modified_at);

        storage.update_account(&first).await.unwrap();
        let second = storage
            .get_account_by_id(&account.id)
            .await
            .unwrap()
            .unwrap();
        assert!(second.modified_at > first.modified_at);
        assert_eq!(second.created_at, account.created_at);
    }

    #[tokio::test]
    async fn test_delete_account_removes_claims() {
        let storage = MemoryIdentityStorage::default();
        let account = storage
            .create_account(&new_account("a@x.com", "AAAAAA"), "Passw0rd")
            .await
            .unwrap();
        storage
            .add_account_claims(&account.id, &[AccountClaim::new("sub", account.id.clone())])
            .await
            .unwrap();

        storage.delete_account(&account.id).await.unwrap();

        assert!(
            storage
                .get_account_by_id(&account.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            storage
                .get_account_claims(&account.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_add_claims_to_missing_account_fails() {
        let storage = MemoryIdentityStorage::default();
        let result = storage
            .add_account_claims("no-such-id", &[AccountClaim::new("sub", "x")])
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_to_existing_email_conflicts() {
        let storage = MemoryIdentityStorage::default();
        storage
            .create_account(&new_account("a@x.com", "AAAAAA"), "Passw0rd")
            .await
            .unwrap();
        let second = storage
            .create_account(&new_account("b@x.com", "BBBBBB"), "Passw0rd")
            .await
            .unwrap();

        let mut changed = second.clone();
        changed.email = "a@x.com".to_string();
        let result = storage.update_account(&changed).await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        // Nothing was written.
        let unchanged = storage
            .get_account_by_id(&second.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.email, "b@x.com");
    }

    #[tokio::test]
    async fn test_client_batch_with_repeated_id_conflicts() {
        let storage = MemoryIdentityStorage::default();
        let client = |id: &str, name: &str| OAuthClient {
            client_id: id.to_string(),
            client_name: name.to_string(),
            client_uri: None,
            secret_digest: "digest".to_string(),
            grant_types: vec![],
            redirect_uris: vec![],
            post_logout_redirect_uris: vec![],
            allowed_scopes: vec![],
            claims: vec![],
            allow_offline_access: true,
            always_include_user_claims: true,
            access_token_lifetime: 84400,
            created_at: Utc::now(),
        };

        let result = storage
            .create_clients(&[client("c1", "first"), client("c1", "second")])
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert!(storage.get_client("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_scope_conflict_commits_nothing() {
        let storage = MemoryIdentityStorage::default();
        let scope = |name: &str| ApiScope {
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            discoverable: false,
            created_at: Utc::now(),
        };

        storage.create_scopes(&[scope("read")]).await.unwrap();

        let result = storage
            .create_scopes(&[scope("write"), scope("read")])
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert!(storage.get_scope("write").await.unwrap().is_none());
    }
}
