//! Storage trait definitions for the credential store.
//!
//! Defines async storage interfaces for accounts, clients, scopes, and
//! resources that can be implemented by various backend providers. Batch
//! creates are a single unit of work: implementations commit every pending
//! entity or none, and report the affected entity count.

use crate::errors::StorageError;
use crate::identity::types::{
    Account, AccountClaim, ApiResource, ApiScope, NewAccount, OAuthClient,
};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for storing and retrieving end-user accounts and their claims
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account with the given password credential.
    ///
    /// The password never reaches the caller again; implementations digest
    /// it before persistence. Validation failures are reported as
    /// [`StorageError::RejectedEntity`] carrying every error description;
    /// unique-index violations as [`StorageError::Conflict`].
    async fn create_account(&self, account: &NewAccount, password: &str) -> Result<Account>;

    /// Retrieve an account by its opaque store identifier
    async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>>;

    /// Retrieve an account by email
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Retrieve an account by its short account id
    async fn get_account_by_account_id(&self, account_id: &str) -> Result<Option<Account>>;

    /// Update an existing account, refreshing its last-modified timestamp
    async fn update_account(&self, account: &Account) -> Result<()>;

    /// Delete an account along with its claims and credential
    async fn delete_account(&self, id: &str) -> Result<()>;

    /// Attach claims to an existing account
    async fn add_account_claims(&self, account_id: &str, claims: &[AccountClaim]) -> Result<()>;

    /// Retrieve all claims attached to an account
    async fn get_account_claims(&self, account_id: &str) -> Result<Vec<AccountClaim>>;
}

/// Trait for storing and retrieving OAuth clients
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Store a batch of clients in one unit of work, returning the number
    /// of entities committed
    async fn create_clients(&self, clients: &[OAuthClient]) -> Result<u64>;

    /// Retrieve a client by ID
    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>>;
}

/// Trait for storing and retrieving API scopes
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Store a batch of scopes in one unit of work, returning the number
    /// of entities committed
    async fn create_scopes(&self, scopes: &[ApiScope]) -> Result<u64>;

    /// Retrieve a scope by name
    async fn get_scope(&self, name: &str) -> Result<Option<ApiScope>>;
}

/// Trait for storing and retrieving API resources
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Store a batch of resources in one unit of work, returning the number
    /// of entities committed
    async fn create_resources(&self, resources: &[ApiResource]) -> Result<u64>;

    /// Retrieve a resource by name
    async fn get_resource(&self, name: &str) -> Result<Option<ApiResource>>;
}

/// Combined credential store trait
pub trait IdentityStorage:
    AccountStore + ClientStore + ScopeStore + ResourceStore + Send + Sync
{
}
