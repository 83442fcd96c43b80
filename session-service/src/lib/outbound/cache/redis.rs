use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::RedisError;

use crate::domain::cache::Cache;
use crate::domain::errors::CacheError;

const SCAN_BATCH: usize = 100;

/// Redis-backed cache. Every command is bounded by `operation_timeout`.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    operation_timeout: Duration,
}

impl RedisCache {
    /// Connect and verify the server answers `PING`.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL
    /// * `operation_timeout` - Upper bound for connecting and for each command
    ///
    /// # Errors
    /// * `Unavailable` - Server refused or dropped the connection
    /// * `Timeout` - No answer within `operation_timeout`
    /// * `Backend` - Invalid URL or unexpected reply
    pub async fn connect(url: &str, operation_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(classify)?;
        let connection = bounded(operation_timeout, ConnectionManager::new(client)).await?;

        let cache = Self {
            connection,
            operation_timeout,
        };

        let mut connection = cache.connection.clone();
        let ping = redis::cmd("PING");
        let _: String = bounded(operation_timeout, ping.query_async(&mut connection)).await?;

        Ok(cache)
    }
}

fn classify(err: RedisError) -> CacheError {
    if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Backend(err.to_string())
    }
}

async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result.map_err(classify),
        Err(_) => Err(CacheError::Timeout(limit)),
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut connection = self.connection.clone();
        let cmd = redis::cmd("GET").arg(key).clone();
        bounded(self.operation_timeout, cmd.query_async(&mut connection)).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let cmd = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .clone();
        bounded(self.operation_timeout, cmd.query_async(&mut connection)).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let cmd = redis::cmd("DEL").arg(key).clone();
        let _: u64 = bounded(self.operation_timeout, cmd.query_async(&mut connection)).await?;
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let scan = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .clone();
            let (next, keys): (u64, Vec<String>) =
                bounded(self.operation_timeout, scan.query_async(&mut connection)).await?;

            if !keys.is_empty() {
                let del = redis::cmd("DEL").arg(&keys).clone();
                let count: u64 =
                    bounded(self.operation_timeout, del.query_async(&mut connection)).await?;
                removed += count;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::debug!(pattern, removed, "Cache entries invalidated");
        Ok(())
    }
}
