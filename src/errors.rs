//! Standardized error types following the `error-idp-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-idp-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when PORT cannot be parsed
    #[error("error-idp-config-2 Parsing PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-idp-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when duration string cannot be parsed
    #[error("error-idp-config-4 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when a numeric setting cannot be parsed
    #[error("error-idp-config-5 Failed to parse '{0}' into an integer: {1}")]
    IntParsingFailed(String, std::num::ParseIntError),
}

/// Database/storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-idp-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when query execution fails
    #[error("error-idp-storage-2 Query execution failed: {0}")]
    QueryFailed(String),

    /// Error when data serialization fails
    #[error("error-idp-storage-3 Data serialization failed: {0}")]
    SerializationFailed(String),

    /// Error when database operation fails
    #[error("error-idp-storage-4 Database error: {0}")]
    DatabaseError(String),

    /// Error when data validation fails
    #[error("error-idp-storage-5 Invalid data: {0}")]
    InvalidData(String),

    /// Error when requested resource is not found
    #[error("error-idp-storage-6 Not found: {0}")]
    NotFound(String),

    /// Error when a unique constraint rejects a write
    #[error("error-idp-storage-7 Conflict: {0}")]
    Conflict(String),

    /// Error when the store rejects an entity, carrying every reported
    /// validation description
    #[error("error-idp-storage-8 Entity rejected: {0}")]
    RejectedEntity(String),
}

/// Account identifier generation errors
#[derive(Debug, Error)]
pub enum AccountIdError {
    /// Every probed candidate collided with an existing account
    #[error("error-idp-accountid-1 Account id keyspace exhausted after {0} attempts")]
    KeyspaceExhausted(usize),

    /// The store could not be reached while probing a candidate
    #[error("error-idp-accountid-2 Account id probe failed: {0}")]
    ProbeFailed(StorageError),
}
