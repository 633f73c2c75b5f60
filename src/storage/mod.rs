//! Trait-based credential store abstractions with in-memory and SQLite backends.

pub mod inmemory;
pub mod traits;
pub(crate) mod validation;

// Feature-gated storage implementations
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export commonly used types and traits
pub use inmemory::MemoryIdentityStorage;
pub use traits::*;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteIdentityStorage;

use crate::config::PasswordPolicy;
use crate::errors::StorageError;
use std::sync::Arc;

/// Storage backend configuration and factory
#[derive(Clone)]
pub enum StorageBackend {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite(String), // Connection string/path
}

/// Create a storage backend based on configuration
pub async fn create_storage_backend(
    backend: StorageBackend,
    password_policy: PasswordPolicy,
) -> std::result::Result<Arc<dyn IdentityStorage>, StorageError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryIdentityStorage::new(password_policy))),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite(database_url) => {
            let pool = sqlx::SqlitePool::connect(&database_url)
                .await
                .map_err(|e| {
                    StorageError::ConnectionFailed(format!("SQLite connection failed: {}", e))
                })?;

            let storage = sqlite::SqliteIdentityStorage::new(pool, password_policy);

            // Run migrations
            storage.migrate().await?;

            Ok(Arc::new(storage))
        }
    }
}

/// Parse storage backend from configuration string
pub fn parse_storage_backend(
    backend_name: &str,
    database_url: Option<&str>,
) -> std::result::Result<StorageBackend, StorageError> {
    #[cfg(not(feature = "sqlite"))]
    let _ = database_url;

    match backend_name {
        "memory" => Ok(StorageBackend::Memory),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let url = database_url.unwrap_or("sqlite:idp.db");
            Ok(StorageBackend::Sqlite(url.to_string()))
        }
        _ => Err(StorageError::InvalidData(format!(
            "Unknown storage backend: {}",
            backend_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_storage_backend() {
        assert!(matches!(
            parse_storage_backend("memory", None),
            Ok(StorageBackend::Memory)
        ));
        // A database URL is ignored for the memory backend.
        assert!(matches!(
            parse_storage_backend("memory", Some("sqlite:idp.db")),
            Ok(StorageBackend::Memory)
        ));
        assert!(parse_storage_backend("bogus", None).is_err());
    }
}
