use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::CacheError;

/// Key/value cache with expiring entries.
///
/// Values are opaque bytes; callers own serialization.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Read a value.
    ///
    /// # Arguments
    /// * `key` - Cache key
    ///
    /// # Returns
    /// Stored bytes, or None on a miss
    ///
    /// # Errors
    /// * `Unavailable` / `Timeout` / `Backend` - Backend could not answer
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Write a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a single key. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key matching a glob pattern such as `permissions:*`.
    async fn invalidate(&self, pattern: &str) -> Result<(), CacheError>;
}
