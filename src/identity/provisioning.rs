//! OAuth client, API scope, and API resource provisioning.
//!
//! Transforms administrative input into protocol entities and persists each
//! batch as a single unit of work. Secrets are hashed before any entity is
//! constructed; a zero affected-row report from the store fails the whole
//! batch.

use crate::errors::StorageError;
use crate::identity::operation::{FailureKind, OperationResult};
use crate::identity::secrets::SecretHasher;
use crate::identity::types::{
    ApiResource, ApiScope, ClientClaim, ClientCredentials, GrantType, OAuthClient,
    ResourceCredentials, ScopeCredentials, STANDARD_IDENTITY_SCOPES, claim_types,
};
use crate::storage::traits::IdentityStorage;
use chrono::Utc;
use std::sync::Arc;

/// Builds and persists protocol entities from administrative input
pub struct ProvisioningService {
    storage: Arc<dyn IdentityStorage>,
    hasher: Arc<dyn SecretHasher>,
    /// Access token lifetime handed to every provisioned client, in seconds
    access_token_lifetime: i64,
}

impl ProvisioningService {
    pub fn new(
        storage: Arc<dyn IdentityStorage>,
        hasher: Arc<dyn SecretHasher>,
        access_token_lifetime: chrono::Duration,
    ) -> Self {
        Self {
            storage,
            hasher,
            access_token_lifetime: access_token_lifetime.num_seconds(),
        }
    }

    /// Provision a single API scope
    pub async fn create_scope(&self, credentials: ScopeCredentials) -> OperationResult<()> {
        self.create_scopes(vec![credentials]).await
    }

    /// Provision a batch of API scopes in one unit of work
    pub async fn create_scopes(&self, credentials: Vec<ScopeCredentials>) -> OperationResult<()> {
        let scopes: Vec<ApiScope> = credentials.iter().map(|c| self.build_scope(c)).collect();

        self.save_batch(self.storage.create_scopes(&scopes).await)
    }

    /// Provision an API resource, hashing its API secret
    pub async fn create_resource(&self, credentials: ResourceCredentials) -> OperationResult<()> {
        let resource = ApiResource {
            name: credentials.name,
            display_name: credentials.display_name,
            description: credentials.description,
            scopes: credentials.scopes,
            secret_digest: self.hasher.hash(&credentials.api_secret),
            required_claims: vec![claim_types::SUBJECT.to_string()],
            created_at: Utc::now(),
        };

        self.save_batch(self.storage.create_resources(&[resource]).await)
    }

    /// Provision a single client; grant types and redirect URIs are taken
    /// verbatim from input, and no per-client claims are attached.
    pub async fn create_client(&self, credentials: ClientCredentials) -> OperationResult<()> {
        if let Some(conflict) = self.check_client_conflicts(&[&credentials]).await {
            return conflict;
        }

        let client = self.build_client(&credentials, None, false);

        self.save_batch(self.storage.create_clients(&[client]).await)
    }

    /// Provision a batch of interactive clients in one unit of work.
    ///
    /// Every client in the batch is forced onto the authorization-code
    /// grant regardless of the grant types supplied by the caller.
    pub async fn create_clients(&self, credentials: Vec<ClientCredentials>) -> OperationResult<()> {
        if let Some(conflict) = self
            .check_client_conflicts(&credentials.iter().collect::<Vec<_>>())
            .await
        {
            return conflict;
        }

        let clients: Vec<OAuthClient> = credentials
            .iter()
            .map(|c| self.build_client(c, Some(GrantType::AuthorizationCode), true))
            .collect();

        self.save_batch(self.storage.create_clients(&clients).await)
    }

    /// Provision a batch of machine-to-machine clients in one unit of work.
    ///
    /// Clients are forced onto the client-credentials grant, carry no
    /// redirect URIs, and are granted only their custom scope.
    pub async fn create_system_clients(
        &self,
        credentials: Vec<ClientCredentials>,
    ) -> OperationResult<()> {
        if let Some(conflict) = self
            .check_client_conflicts(&credentials.iter().collect::<Vec<_>>())
            .await
        {
            return conflict;
        }

        let clients: Vec<OAuthClient> = credentials
            .iter()
            .map(|c| {
                let mut client = self.build_client(c, Some(GrantType::ClientCredentials), true);
                client.redirect_uris = Vec::new();
                client.post_logout_redirect_uris = Vec::new();
                client.allowed_scopes = vec![c.scope.clone()];
                client
            })
            .collect();

        self.save_batch(self.storage.create_clients(&clients).await)
    }

    fn build_scope(&self, credentials: &ScopeCredentials) -> ApiScope {
        ApiScope {
            name: credentials.name.clone(),
            display_name: credentials.display_name.clone(),
            description: credentials.description.clone(),
            // Provisioned scopes are kept out of the discovery document.
            discoverable: false,
            created_at: Utc::now(),
        }
    }

    fn build_client(
        &self,
        credentials: &ClientCredentials,
        grant_type_override: Option<GrantType>,
        include_claims: bool,
    ) -> OAuthClient {
        let grant_types = match grant_type_override {
            Some(grant_type) => vec![grant_type],
            None => credentials.grant_types.clone(),
        };

        let mut allowed_scopes: Vec<String> = STANDARD_IDENTITY_SCOPES
            .iter()
            .map(|s| s.to_string())
            .collect();
        allowed_scopes.push(credentials.scope.clone());

        let claims = if include_claims {
            let mut claims: Vec<ClientClaim> = credentials
                .additional_claims
                .iter()
                .map(|(claim_type, value)| ClientClaim {
                    claim_type: claim_type.clone(),
                    value: value.clone(),
                })
                .collect();
            claims.sort_by(|a, b| a.claim_type.cmp(&b.claim_type));
            claims
        } else {
            Vec::new()
        };

        OAuthClient {
            client_id: credentials.id.clone(),
            client_name: credentials.name.clone(),
            client_uri: credentials.uri.clone(),
            secret_digest: self.hasher.hash(&credentials.secret),
            grant_types,
            redirect_uris: credentials.redirect_uris.clone(),
            post_logout_redirect_uris: credentials.post_logout_redirect_uris.clone(),
            allowed_scopes,
            claims,
            allow_offline_access: true,
            always_include_user_claims: true,
            access_token_lifetime: self.access_token_lifetime,
            created_at: Utc::now(),
        }
    }

    /// Pre-check every client id in the batch before any write; a duplicate
    /// is caller error and must leave the store untouched. The store's
    /// unique index remains the guarantee under concurrent provisioning.
    async fn check_client_conflicts(
        &self,
        credentials: &[&ClientCredentials],
    ) -> Option<OperationResult<()>> {
        for c in credentials {
            match self.storage.get_client(&c.id).await {
                Ok(Some(_)) => {
                    tracing::debug!(client_id = %c.id, "client provisioning rejected, id exists");
                    return Some(OperationResult::failure(
                        FailureKind::ValidationConflict,
                        "CONFLICT",
                        format!("A client with id '{}' already exists", c.id),
                    ));
                }
                Ok(None) => {}
                Err(e) => return Some(OperationResult::system_error(e.to_string())),
            }
        }
        None
    }

    /// Normalize a batch save outcome into the operation envelope
    fn save_batch(&self, outcome: Result<u64, StorageError>) -> OperationResult<()> {
        match outcome {
            Ok(0) => {
                tracing::error!("batch save affected zero rows");
                OperationResult::system_error("Operation failed due to database error")
            }
            Ok(_) => OperationResult::success(()),
            Err(StorageError::Conflict(message)) => {
                OperationResult::failure(FailureKind::ValidationConflict, "CONFLICT", message)
            }
            Err(e) => OperationResult::system_error(e.to_string()),
        }
    }
}
