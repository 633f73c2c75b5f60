//! Store-side entity validation shared by every backend.

use crate::config::PasswordPolicy;
use crate::identity::types::NewAccount;

/// Validate a new account and its password, collecting every error
/// description so callers can surface them all at once.
pub(crate) fn validate_new_account(
    account: &NewAccount,
    password: &str,
    policy: &PasswordPolicy,
) -> Vec<String> {
    let mut errors = Vec::new();

    if account.email.is_empty() || !account.email.contains('@') {
        errors.push(format!("Email '{}' is invalid", account.email));
    }
    if account.first_name.is_empty() {
        errors.push("First name must not be empty".to_string());
    }
    if account.last_name.is_empty() {
        errors.push("Last name must not be empty".to_string());
    }
    if password.len() < policy.min_length {
        errors.push(format!(
            "Passwords must be at least {} characters",
            policy.min_length
        ));
    }

    errors
}
