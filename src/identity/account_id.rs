//! Collision-resistant short account identifier generation.
//!
//! Candidates are derived from a fresh 128-bit random draw per attempt,
//! base64-encoded, stripped to alphanumerics, truncated, and uppercased.
//! Probing against the existing account population is bounded; if the
//! 6-character keyspace exhausts the attempt cap the generator widens to
//! 8 characters before giving up. The store's unique index on account id
//! remains the actual safety net under concurrent registration.

use crate::errors::AccountIdError;
use crate::storage::traits::IdentityStorage;
use base64::prelude::*;
use rand::Rng;
use std::sync::Arc;

/// Length of a generated account id
pub const ACCOUNT_ID_LENGTH: usize = 6;

/// Widened length used once the primary keyspace exhausts its attempt cap
const FALLBACK_ACCOUNT_ID_LENGTH: usize = 8;

/// Generates short, unique, human-typable account identifiers
pub struct AccountIdGenerator {
    storage: Arc<dyn IdentityStorage>,
    max_attempts: usize,
}

impl AccountIdGenerator {
    pub fn new(storage: Arc<dyn IdentityStorage>, max_attempts: usize) -> Self {
        Self {
            storage,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Generate an account id not currently held by any account.
    ///
    /// Fails only if the store is unreachable or both keyspace widths
    /// exhaust their attempt caps.
    pub async fn generate(&self) -> Result<String, AccountIdError> {
        for width in [ACCOUNT_ID_LENGTH, FALLBACK_ACCOUNT_ID_LENGTH] {
            for _ in 0..self.max_attempts {
                let candidate = random_account_id(width);
                match self.storage.get_account_by_account_id(&candidate).await {
                    Ok(None) => return Ok(candidate),
                    Ok(Some(_)) => continue,
                    Err(e) => return Err(AccountIdError::ProbeFailed(e)),
                }
            }
            tracing::warn!(width, "account id attempts exhausted, widening keyspace");
        }

        Err(AccountIdError::KeyspaceExhausted(self.max_attempts * 2))
    }
}

/// Derive a candidate id of the given width from a fresh random draw
fn random_account_id(width: usize) -> String {
    loop {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill(&mut bytes);
        let candidate: String = BASE64_STANDARD
            .encode(bytes)
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(width)
            .collect::<String>()
            .to_uppercase();

        // Base64 of 16 bytes yields 22 data characters; stripping the
        // non-alphanumeric ones can in principle leave too few.
        if candidate.len() == width {
            return candidate;
        }
    }
}
