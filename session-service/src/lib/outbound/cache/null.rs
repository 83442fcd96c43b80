use std::time::Duration;

use async_trait::async_trait;

use crate::domain::cache::Cache;
use crate::domain::errors::CacheError;

/// Cache that stores nothing: every read misses, every write succeeds.
///
/// Stands in for Redis when no cache is configured or it cannot be reached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl Cache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn invalidate(&self, _pattern: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
