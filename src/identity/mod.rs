//! Account registration orchestration and OAuth2/OIDC entity provisioning.

pub mod account_id;
pub mod operation;
pub mod provisioning;
pub mod registration;
pub mod secrets;
pub mod types;

// Re-export frequently used items from each module
pub use account_id::{ACCOUNT_ID_LENGTH, AccountIdGenerator};
pub use operation::{FailureKind, OperationResult};
pub use provisioning::ProvisioningService;
pub use registration::RegistrationService;
pub use secrets::{SecretHasher, Sha256SecretHasher};
pub use types::{
    Account, AccountClaim, AccountUpdateRequest, ApiResource, ApiScope, ClientClaim,
    ClientCredentials, GrantType, NewAccount, OAuthClient, RegisterRequest, RegisteredAccount,
    ResourceCredentials, ScopeCredentials,
};
