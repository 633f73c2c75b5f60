//! Account registration orchestration.
//!
//! Coordinates the uniqueness check, account id assignment, account
//! creation, and claim attachment for a registration, with a compensating
//! delete when claim attachment fails after the account record already
//! exists. Steps are strictly sequential; each failure short-circuits into
//! an [`OperationResult`] failure without retry.

use crate::errors::StorageError;
use crate::identity::account_id::AccountIdGenerator;
use crate::identity::operation::{FailureKind, OperationResult};
use crate::identity::types::{
    AccountClaim, AccountUpdateRequest, NewAccount, RegisterRequest, RegisteredAccount,
    claim_types,
};
use crate::storage::traits::IdentityStorage;
use std::sync::Arc;

/// Orchestrates end-user account registration and profile updates
pub struct RegistrationService {
    storage: Arc<dyn IdentityStorage>,
    account_ids: AccountIdGenerator,
}

impl RegistrationService {
    pub fn new(storage: Arc<dyn IdentityStorage>, account_id_max_attempts: usize) -> Self {
        let account_ids = AccountIdGenerator::new(storage.clone(), account_id_max_attempts);
        Self {
            storage,
            account_ids,
        }
    }

    /// Register a new account and attach its authorization claims.
    ///
    /// The email uniqueness check here is a read-then-write optimization;
    /// under concurrent registration of the same email the store's unique
    /// index is the guarantee that at most one account survives.
    pub async fn register(&self, request: RegisterRequest) -> OperationResult<RegisteredAccount> {
        match self.storage.get_account_by_email(&request.email).await {
            Ok(Some(_)) => {
                tracing::debug!(email = %request.email, "registration rejected, email exists");
                return OperationResult::failure(
                    FailureKind::ValidationConflict,
                    "CONFLICT",
                    "The specified email already exists",
                );
            }
            Ok(None) => {}
            Err(e) => return OperationResult::system_error(e.to_string()),
        }

        let account_id = match self.account_ids.generate().await {
            Ok(account_id) => account_id,
            Err(e) => return OperationResult::system_error(e.to_string()),
        };

        let new_account = NewAccount {
            account_id,
            email: request.email.clone(),
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
        };

        match self
            .storage
            .create_account(&new_account, &request.password)
            .await
        {
            Ok(_) => {}
            Err(StorageError::RejectedEntity(errors)) => {
                tracing::error!(%errors, "account creation rejected by store");
                return OperationResult::failure(
                    FailureKind::CreationFailed,
                    "User Creation Failed",
                    errors,
                );
            }
            Err(e) => return OperationResult::system_error(e.to_string()),
        }

        // Re-fetch by email so any store-side normalization is reflected in
        // the claim values.
        let account = match self.storage.get_account_by_email(&request.email).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return OperationResult::system_error(
                    "Created account could not be fetched by email",
                );
            }
            Err(e) => return OperationResult::system_error(e.to_string()),
        };

        let claims = vec![
            AccountClaim::new(claim_types::SUBJECT, account.id.clone()),
            AccountClaim::new(claim_types::GIVEN_NAME, account.first_name.clone()),
            AccountClaim::new(claim_types::FAMILY_NAME, account.last_name.clone()),
            AccountClaim::new(claim_types::EMAIL, account.email.clone()),
            AccountClaim::new(claim_types::SCOPE, request.scope),
        ];

        if let Err(claim_error) = self.storage.add_account_claims(&account.id, &claims).await {
            tracing::error!(
                account_id = %account.account_id,
                error = %claim_error,
                "claim attachment failed, rolling back account creation"
            );

            if let Err(rollback_error) = self.storage.delete_account(&account.id).await {
                tracing::error!(
                    account_id = %account.account_id,
                    error = %rollback_error,
                    "compensating account delete failed"
                );
                return OperationResult::failure(
                    FailureKind::RollbackFailure,
                    "User Creation Failed",
                    format!(
                        "Claim creation failed ({claim_error}) and the compensating account delete also failed ({rollback_error})"
                    ),
                );
            }

            // Claim issuance failing after a valid account write is an
            // invariant violation, not caller error.
            return OperationResult::failure(
                FailureKind::SystemError,
                "User Creation Failed",
                claim_error.to_string(),
            );
        }

        OperationResult::success(RegisteredAccount {
            id: account.id,
            account_id: account.account_id,
        })
    }

    /// Apply a partial profile update; absent fields mean "no change".
    /// The last-modified timestamp is refreshed by the store, not here.
    pub async fn update(&self, id: &str, request: AccountUpdateRequest) -> OperationResult<()> {
        let mut account = match self.storage.get_account_by_id(id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::warn!(%id, "account not found for update");
                return OperationResult::failure(
                    FailureKind::NotFound,
                    "NOT FOUND",
                    "There is no existing user that corresponds with the specified id",
                );
            }
            Err(e) => return OperationResult::system_error(e.to_string()),
        };

        account.first_name = request.first_name.unwrap_or(account.first_name);
        account.last_name = request.last_name.unwrap_or(account.last_name);
        account.phone = request.phone.or(account.phone);

        match self.storage.update_account(&account).await {
            Ok(()) => OperationResult::success(()),
            Err(StorageError::RejectedEntity(errors)) => {
                tracing::error!(%errors, "account update rejected by store");
                OperationResult::failure(FailureKind::CreationFailed, "User Update Failed", errors)
            }
            Err(e) => OperationResult::system_error(e.to_string()),
        }
    }
}
