//! Registration and Provisioning Integration Tests
//!
//! These tests verify the complete registration flow including rollback on
//! claim attachment failure, and the client/scope/resource provisioning
//! flows including all-or-nothing batch behavior.

use async_trait::async_trait;
use idp::config::PasswordPolicy;
use idp::errors::StorageError;
use idp::identity::{
    FailureKind, GrantType, OperationResult, ProvisioningService, RegistrationService,
    Sha256SecretHasher,
};
use idp::identity::types::{
    Account, AccountClaim, AccountUpdateRequest, ApiResource, ApiScope, ClientCredentials,
    NewAccount, OAuthClient, RegisterRequest, RegisteredAccount, ResourceCredentials,
    ScopeCredentials,
};
use idp::storage::inmemory::MemoryIdentityStorage;
use idp::storage::traits::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Storage wrapper that can be toggled to fail claim attachment or client
/// batch saves, delegating everything else to the in-memory store.
struct FailingStorage {
    inner: MemoryIdentityStorage,
    fail_claims: AtomicBool,
    fail_deletes: AtomicBool,
    fail_client_saves: AtomicBool,
}

impl FailingStorage {
    fn new() -> Self {
        Self {
            inner: MemoryIdentityStorage::new(PasswordPolicy::default()),
            fail_claims: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_client_saves: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AccountStore for FailingStorage {
    async fn create_account(&self, account: &NewAccount, password: &str) -> Result<Account> {
        self.inner.create_account(account, password).await
    }

    async fn get_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_id(id).await
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_email(email).await
    }

    async fn get_account_by_account_id(&self, account_id: &str) -> Result<Option<Account>> {
        self.inner.get_account_by_account_id(account_id).await
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        self.inner.update_account(account).await
    }

    async fn delete_account(&self, id: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DatabaseError(
                "account delete refused".to_string(),
            ));
        }
        self.inner.delete_account(id).await
    }

    async fn add_account_claims(&self, account_id: &str, claims: &[AccountClaim]) -> Result<()> {
        if self.fail_claims.load(Ordering::SeqCst) {
            return Err(StorageError::DatabaseError(
                "claim write refused".to_string(),
            ));
        }
        self.inner.add_account_claims(account_id, claims).await
    }

    async fn get_account_claims(&self, account_id: &str) -> Result<Vec<AccountClaim>> {
        self.inner.get_account_claims(account_id).await
    }
}

#[async_trait]
impl ClientStore for FailingStorage {
    async fn create_clients(&self, clients: &[OAuthClient]) -> Result<u64> {
        if self.fail_client_saves.load(Ordering::SeqCst) {
            return Err(StorageError::DatabaseError(
                "client write refused".to_string(),
            ));
        }
        self.inner.create_clients(clients).await
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        self.inner.get_client(client_id).await
    }
}

#[async_trait]
impl ScopeStore for FailingStorage {
    async fn create_scopes(&self, scopes: &[ApiScope]) -> Result<u64> {
        self.inner.create_scopes(scopes).await
    }

    async fn get_scope(&self, name: &str) -> Result<Option<ApiScope>> {
        self.inner.get_scope(name).await
    }
}

#[async_trait]
impl ResourceStore for FailingStorage {
    async fn create_resources(&self, resources: &[ApiResource]) -> Result<u64> {
        self.inner.create_resources(resources).await
    }

    async fn get_resource(&self, name: &str) -> Result<Option<ApiResource>> {
        self.inner.get_resource(name).await
    }
}

impl IdentityStorage for FailingStorage {}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "Passw0rd!".to_string(),
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        phone: Some("555-0100".to_string()),
        scope: "deesapp".to_string(),
    }
}

fn client_credentials(id: &str) -> ClientCredentials {
    ClientCredentials {
        id: id.to_string(),
        name: format!("Client {id}"),
        uri: Some("https://app.example.com".to_string()),
        secret: "s3cret".to_string(),
        scope: "read".to_string(),
        grant_types: vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
        redirect_uris: vec!["https://app.example.com/callback".to_string()],
        post_logout_redirect_uris: vec!["https://app.example.com/logout".to_string()],
        additional_claims: HashMap::new(),
    }
}

fn expect_success<T>(result: OperationResult<T>) -> T {
    match result {
        OperationResult::Success(payload) => payload,
        OperationResult::Failure { title, message, .. } => {
            panic!("operation failed: {title}: {message}")
        }
    }
}

fn provisioning_service(storage: Arc<dyn IdentityStorage>) -> ProvisioningService {
    ProvisioningService::new(
        storage,
        Arc::new(Sha256SecretHasher),
        chrono::Duration::seconds(84400),
    )
}

#[tokio::test]
async fn test_complete_registration_flow() {
    let storage = Arc::new(MemoryIdentityStorage::new(PasswordPolicy::default()));
    let service = RegistrationService::new(storage.clone(), 32);

    let registered: RegisteredAccount =
        expect_success(service.register(register_request("grace@example.com")).await);

    assert_eq!(registered.account_id.len(), 6);
    assert!(
        registered
            .account_id
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    );

    // The account is retrievable by all three lookup keys.
    let account = storage
        .get_account_by_account_id(&registered.account_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.id, registered.id);
    assert_eq!(account.email, "grace@example.com");

    let claims = storage.get_account_claims(&account.id).await.unwrap();
    assert_eq!(claims.len(), 5);
    assert!(claims.contains(&AccountClaim::new("sub", account.id.clone())));
    assert!(claims.contains(&AccountClaim::new("scope", "deesapp")));

    // A second registration reuses nothing from the first.
    let second = expect_success(service.register(register_request("ada@example.com")).await);
    assert_ne!(second.account_id, registered.account_id);

    // Profile update touches only the supplied fields.
    expect_success(
        service
            .update(
                &registered.id,
                AccountUpdateRequest {
                    first_name: None,
                    last_name: Some("Murray".to_string()),
                    phone: None,
                },
            )
            .await,
    );
    let updated = storage
        .get_account_by_id(&registered.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.first_name, "Grace");
    assert_eq!(updated.last_name, "Murray");
    assert_eq!(updated.phone, Some("555-0100".to_string()));
}

#[tokio::test]
async fn test_duplicate_email_registration_conflicts() {
    let storage = Arc::new(MemoryIdentityStorage::new(PasswordPolicy::default()));
    let service = RegistrationService::new(storage.clone(), 32);

    expect_success(service.register(register_request("grace@example.com")).await);

    let result = service.register(register_request("grace@example.com")).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::ValidationConflict));
}

#[tokio::test]
async fn test_claim_failure_rolls_back_account() {
    let storage = Arc::new(FailingStorage::new());
    let service = RegistrationService::new(storage.clone(), 32);

    storage.fail_claims.store(true, Ordering::SeqCst);

    let result = service.register(register_request("grace@example.com")).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::SystemError));

    // The compensating delete removed the account record, so the email is
    // free for a later registration.
    assert!(
        storage
            .get_account_by_email("grace@example.com")
            .await
            .unwrap()
            .is_none()
    );

    storage.fail_claims.store(false, Ordering::SeqCst);
    expect_success(service.register(register_request("grace@example.com")).await);
}

#[tokio::test]
async fn test_failed_compensating_delete_is_reported_distinctly() {
    let storage = Arc::new(FailingStorage::new());
    let service = RegistrationService::new(storage.clone(), 32);

    storage.fail_claims.store(true, Ordering::SeqCst);
    storage.fail_deletes.store(true, Ordering::SeqCst);

    let result = service.register(register_request("grace@example.com")).await;
    assert_eq!(result.failure_kind(), Some(FailureKind::RollbackFailure));

    // Both the triggering claim error and the rollback error are surfaced,
    // neither swallowed by the other.
    match result {
        OperationResult::Failure { message, .. } => {
            assert!(message.contains("claim write refused"));
            assert!(message.contains("account delete refused"));
        }
        OperationResult::Success(_) => panic!("expected RollbackFailure"),
    }

    // The account record is orphaned; it stays visible for operator cleanup.
    assert!(
        storage
            .get_account_by_email("grace@example.com")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_client_batch_save_failure_commits_nothing() {
    let storage = Arc::new(FailingStorage::new());
    let service = provisioning_service(storage.clone());

    storage.fail_client_saves.store(true, Ordering::SeqCst);

    let result = service
        .create_clients(vec![client_credentials("c1"), client_credentials("c2")])
        .await;
    assert_eq!(result.failure_kind(), Some(FailureKind::SystemError));

    assert!(storage.get_client("c1").await.unwrap().is_none());
    assert!(storage.get_client("c2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_client_hashes_secret_and_grants_identity_scopes() {
    let storage = Arc::new(MemoryIdentityStorage::new(PasswordPolicy::default()));
    let service = provisioning_service(storage.clone());

    expect_success(service.create_client(client_credentials("c1")).await);

    let client = storage.get_client("c1").await.unwrap().unwrap();
    assert_ne!(client.secret_digest, "s3cret");
    for scope in ["openid", "email", "profile", "read"] {
        assert!(client.allowed_scopes.iter().any(|s| s == scope));
    }
    // Grant types pass through verbatim for single-client provisioning.
    assert_eq!(
        client.grant_types,
        vec![GrantType::AuthorizationCode, GrantType::RefreshToken]
    );
    assert_eq!(client.access_token_lifetime, 84400);
    assert!(client.allow_offline_access);
    assert!(client.always_include_user_claims);
}

#[tokio::test]
async fn test_duplicate_client_id_conflicts_before_any_write() {
    let storage = Arc::new(MemoryIdentityStorage::new(PasswordPolicy::default()));
    let service = provisioning_service(storage.clone());

    expect_success(service.create_client(client_credentials("c1")).await);

    let result = service
        .create_clients(vec![client_credentials("c2"), client_credentials("c1")])
        .await;
    assert_eq!(result.failure_kind(), Some(FailureKind::ValidationConflict));
    assert!(storage.get_client("c2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_system_clients_have_no_redirects_and_custom_scope_only() {
    let storage = Arc::new(MemoryIdentityStorage::new(PasswordPolicy::default()));
    let service = provisioning_service(storage.clone());

    let mut credentials = client_credentials("svc");
    credentials
        .additional_claims
        .insert("role".to_string(), "worker".to_string());

    expect_success(service.create_system_clients(vec![credentials]).await);

    let client = storage.get_client("svc").await.unwrap().unwrap();
    assert_eq!(client.grant_types, vec![GrantType::ClientCredentials]);
    assert!(client.redirect_uris.is_empty());
    assert!(client.post_logout_redirect_uris.is_empty());
    assert_eq!(client.allowed_scopes, vec!["read".to_string()]);
    assert_eq!(client.claims.len(), 1);
    assert_eq!(client.claims[0].claim_type, "role");
}

#[tokio::test]
async fn test_scope_and_resource_provisioning() {
    let storage = Arc::new(MemoryIdentityStorage::new(PasswordPolicy::default()));
    let service = provisioning_service(storage.clone());

    expect_success(
        service
            .create_scopes(vec![
                ScopeCredentials {
                    name: "read".to_string(),
                    display_name: "Read".to_string(),
                    description: "Read access".to_string(),
                },
                ScopeCredentials {
                    name: "write".to_string(),
                    display_name: "Write".to_string(),
                    description: "Write access".to_string(),
                },
            ])
            .await,
    );
    assert!(storage.get_scope("read").await.unwrap().is_some());
    assert!(storage.get_scope("write").await.unwrap().is_some());

    expect_success(
        service
            .create_resource(ResourceCredentials {
                name: "orders-api".to_string(),
                display_name: "Orders API".to_string(),
                description: "Order management".to_string(),
                scopes: vec!["read".to_string(), "write".to_string()],
                api_secret: "api-s3cret".to_string(),
            })
            .await,
    );

    let resource = storage.get_resource("orders-api").await.unwrap().unwrap();
    assert_ne!(resource.secret_digest, "api-s3cret");
    assert_eq!(resource.required_claims, vec!["sub".to_string()]);
}
