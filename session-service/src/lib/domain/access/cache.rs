use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::cache::Cache;
use crate::domain::user::models::UserId;

const PERMISSIONS_PREFIX: &str = "permissions:";
const ROLES_PREFIX: &str = "roles:";

/// Outcome of a cache read.
///
/// `Empty` is a cached empty list, which is a real answer; only `Miss`
/// sends the caller to the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<T> {
    Hit(T),
    Empty,
    Miss,
}

/// Cache-aside layer for the roles and permissions of users.
///
/// Every operation is best effort: backend failures and undecodable
/// entries read as a miss, failed writes and deletes are only logged.
#[derive(Clone)]
pub struct AccessCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl AccessCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn permissions_key(user_id: &UserId) -> String {
        format!("{PERMISSIONS_PREFIX}{user_id}")
    }

    pub fn roles_key(user_id: &UserId) -> String {
        format!("{ROLES_PREFIX}{user_id}")
    }

    pub async fn permissions(&self, user_id: &UserId) -> Cached<Vec<PermissionCode>> {
        self.read(&Self::permissions_key(user_id)).await
    }

    pub async fn roles(&self, user_id: &UserId) -> Cached<Vec<Role>> {
        self.read(&Self::roles_key(user_id)).await
    }

    pub async fn set_permissions(&self, user_id: &UserId, codes: &[PermissionCode]) {
        self.write(&Self::permissions_key(user_id), codes).await
    }

    pub async fn set_roles(&self, user_id: &UserId, roles: &[Role]) {
        self.write(&Self::roles_key(user_id), roles).await
    }

    /// Drop both cached entries of a user.
    pub async fn invalidate_user(&self, user_id: &UserId) {
        for key in [Self::permissions_key(user_id), Self::roles_key(user_id)] {
            if let Err(e) = self.cache.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "Failed to invalidate cache entry");
            }
        }
    }

    /// Drop the cached permissions of every user.
    pub async fn invalidate_all_permissions(&self) {
        let pattern = format!("{PERMISSIONS_PREFIX}*");
        if let Err(e) = self.cache.invalidate(&pattern).await {
            tracing::warn!(pattern = %pattern, error = %e, "Failed to invalidate cache entries");
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Cached<Vec<T>> {
        let bytes = match self.cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Cached::Miss,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return Cached::Miss;
            }
        };

        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(values) if values.is_empty() => Cached::Empty,
            Ok(values) => Cached::Hit(values),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Undecodable cache entry, treating as miss");
                Cached::Miss
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, values: &[T]) {
        let bytes = match serde_json::to_vec(values) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, bytes, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}
