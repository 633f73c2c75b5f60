//! Environment-based configuration types for the identity provisioning server.

use anyhow::Result;

use crate::errors::ConfigError;

/// HTTP server port configuration
#[derive(Clone)]
pub struct HttpPort(u16);

/// Access token lifetime handed to provisioned clients
#[derive(Clone)]
pub struct AccessTokenLifetime(chrono::Duration);

/// Password requirements enforced by the credential store
#[derive(Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

/// Attempt cap for a single account id keyspace width
#[derive(Clone, Copy)]
pub struct AccountIdMaxAttempts(usize);

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub storage_backend: String,
    pub database_url: Option<String>,
    pub access_token_lifetime: AccessTokenLifetime,
    pub password_policy: PasswordPolicy,
    pub account_id_max_attempts: AccountIdMaxAttempts,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let storage_backend = default_env("STORAGE_BACKEND", "memory");
        let database_url = optional_env("DATABASE_URL");
        let access_token_lifetime: AccessTokenLifetime =
            default_env("ACCESS_TOKEN_LIFETIME", "84400s").try_into()?;
        let password_policy: PasswordPolicy =
            default_env("PASSWORD_MIN_LENGTH", "8").try_into()?;
        let account_id_max_attempts: AccountIdMaxAttempts =
            default_env("ACCOUNT_ID_MAX_ATTEMPTS", "32").try_into()?;

        Ok(Self {
            version: version()?,
            http_port,
            storage_backend,
            database_url,
            access_token_lifetime,
            password_policy,
            account_id_max_attempts,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<String> for AccessTokenLifetime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let duration = duration_str::parse(&value)
            .map_err(|e| ConfigError::DurationParsingFailed(value.clone(), e.to_string()))?;
        let duration = chrono::Duration::from_std(duration)
            .map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))?;
        Ok(Self(duration))
    }
}

impl AsRef<chrono::Duration> for AccessTokenLifetime {
    fn as_ref(&self) -> &chrono::Duration {
        &self.0
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl TryFrom<String> for PasswordPolicy {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        let min_length = value
            .parse::<usize>()
            .map_err(|e| ConfigError::IntParsingFailed(value, e))?;
        Ok(Self { min_length })
    }
}

impl Default for AccountIdMaxAttempts {
    fn default() -> Self {
        Self(32)
    }
}

impl TryFrom<String> for AccountIdMaxAttempts {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(Self::default());
        }
        let attempts = value
            .parse::<usize>()
            .map_err(|e| ConfigError::IntParsingFailed(value, e))?;
        Ok(Self(attempts))
    }
}

impl AsRef<usize> for AccountIdMaxAttempts {
    fn as_ref(&self) -> &usize {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_lifetime_parsing() {
        let lifetime = AccessTokenLifetime::try_from("84400s".to_string()).unwrap();
        assert_eq!(lifetime.as_ref().num_seconds(), 84400);

        let lifetime = AccessTokenLifetime::try_from("1d".to_string()).unwrap();
        assert_eq!(lifetime.as_ref().num_seconds(), 86400);

        assert!(AccessTokenLifetime::try_from("not-a-duration".to_string()).is_err());
    }

    #[test]
    fn test_password_policy_parsing() {
        let policy = PasswordPolicy::try_from("12".to_string()).unwrap();
        assert_eq!(policy.min_length, 12);

        let policy = PasswordPolicy::try_from(String::new()).unwrap();
        assert_eq!(policy.min_length, 8);

        assert!(PasswordPolicy::try_from("twelve".to_string()).is_err());
    }
}
