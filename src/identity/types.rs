//! Core entity and request types for accounts and protocol provisioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OAuth 2 grant types a provisioned client may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    #[serde(alias = "code")]
    AuthorizationCode,
    #[serde(alias = "client-credentials")]
    ClientCredentials,
    RefreshToken,
}

/// Standard OIDC identity scopes granted to every interactive client
pub const STANDARD_IDENTITY_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Claim type names surfaced in issued tokens
pub mod claim_types {
    pub const SUBJECT: &str = "sub";
    pub const GIVEN_NAME: &str = "given_name";
    pub const FAMILY_NAME: &str = "family_name";
    pub const EMAIL: &str = "email";
    pub const SCOPE: &str = "scope";
}

/// A registered end-user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned opaque identifier
    pub id: String,
    /// Short human-facing account id, generated at registration
    pub account_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Set exactly once, at first successful persistence
    pub created_at: DateTime<Utc>,
    /// Strictly increases on every successful mutation
    pub modified_at: DateTime<Utc>,
}

/// Account fields supplied to the store at creation time
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// A typed fact bound to an account, surfaced in issued tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountClaim {
    pub claim_type: String,
    pub value: String,
}

impl AccountClaim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// A typed fact bound to a provisioned client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientClaim {
    pub claim_type: String,
    pub value: String,
}

/// A registered relying-party application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    /// Caller-supplied unique client identifier
    pub client_id: String,
    pub client_name: String,
    pub client_uri: Option<String>,
    /// Secret digest; never holds plaintext
    pub secret_digest: String,
    pub grant_types: Vec<GrantType>,
    pub redirect_uris: Vec<String>,
    pub post_logout_redirect_uris: Vec<String>,
    pub allowed_scopes: Vec<String>,
    pub claims: Vec<ClientClaim>,
    pub allow_offline_access: bool,
    pub always_include_user_claims: bool,
    /// Access token lifetime in seconds
    pub access_token_lifetime: i64,
    pub created_at: DateTime<Utc>,
}

/// A provisioned API scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiScope {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Whether the scope appears in the discovery document
    pub discoverable: bool,
    pub created_at: DateTime<Utc>,
}

/// A provisioned API resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResource {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub scopes: Vec<String>,
    /// API secret digest; never holds plaintext
    pub secret_digest: String,
    /// Claim types the resource requires in access tokens
    pub required_claims: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration request for a new end-user account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Scope claim requested for the account
    pub scope: String,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Payload returned by a successful registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredAccount {
    /// Store-assigned opaque identifier
    pub id: String,
    /// Generated short account id
    pub account_id: String,
}

/// Administrative input for an API scope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeCredentials {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// Administrative input for an API resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCredentials {
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub api_secret: String,
}

/// Administrative input for an OAuth client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCredentials {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    pub secret: String,
    /// Custom scope granted alongside the standard identity scopes
    pub scope: String,
    #[serde(default)]
    pub grant_types: Vec<GrantType>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,
    /// Claim-type to value mapping attached to the client
    #[serde(default)]
    pub additional_claims: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_type_aliases() {
        let grant: GrantType = serde_json::from_str("\"code\"").unwrap();
        assert_eq!(grant, GrantType::AuthorizationCode);

        let grant: GrantType = serde_json::from_str("\"authorization_code\"").unwrap();
        assert_eq!(grant, GrantType::AuthorizationCode);

        let grant: GrantType = serde_json::from_str("\"client_credentials\"").unwrap();
        assert_eq!(grant, GrantType::ClientCredentials);
    }

    #[test]
    fn test_client_credentials_defaults() {
        let credentials: ClientCredentials = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Client One",
            "secret": "s3cret",
            "scope": "read",
        }))
        .unwrap();

        assert!(credentials.grant_types.is_empty());
        assert!(credentials.redirect_uris.is_empty());
        assert!(credentials.additional_claims.is_empty());
        assert!(credentials.uri.is_none());
    }
}
