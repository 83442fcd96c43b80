use std::sync::Arc;

use crate::domain::access::cache::AccessCache;
use crate::domain::access::cache::Cached;
use crate::domain::access::errors::AccessError;
use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::access::ports::AccessRepository;
use crate::domain::user::models::UserId;

/// Roles and permissions of users, read through the cache.
pub struct AccessService<AR>
where
    AR: AccessRepository,
{
    repository: Arc<AR>,
    cache: AccessCache,
}

impl<AR> AccessService<AR>
where
    AR: AccessRepository,
{
    /// Create a new access service.
    ///
    /// # Arguments
    /// * `repository` - Role/permission persistence implementation
    /// * `cache` - Cache-aside layer
    ///
    /// # Returns
    /// Configured access service
    pub fn new(repository: Arc<AR>, cache: AccessCache) -> Self {
        Self { repository, cache }
    }

    /// Permission codes of a user, cached for the configured TTL.
    ///
    /// # Errors
    /// * `DatabaseError` - Cache missed and the repository failed
    pub async fn permissions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PermissionCode>, AccessError> {
        match self.cache.permissions(user_id).await {
            Cached::Hit(codes) => return Ok(codes),
            Cached::Empty => return Ok(Vec::new()),
            Cached::Miss => {}
        }

        let codes = self.repository.permissions_for_user(user_id).await?;
        self.cache.set_permissions(user_id, &codes).await;
        Ok(codes)
    }

    /// Roles of a user, cached for the configured TTL.
    ///
    /// # Errors
    /// * `DatabaseError` - Cache missed and the repository failed
    pub async fn roles_for_user(&self, user_id: &UserId) -> Result<Vec<Role>, AccessError> {
        match self.cache.roles(user_id).await {
            Cached::Hit(roles) => return Ok(roles),
            Cached::Empty => return Ok(Vec::new()),
            Cached::Miss => {}
        }

        let roles = self.repository.roles_for_user(user_id).await?;
        self.cache.set_roles(user_id, &roles).await;
        Ok(roles)
    }

    pub async fn assign_roles(&self, user_id: &UserId, roles: &[Role]) -> Result<(), AccessError> {
        self.repository.add_roles_for_user(user_id, roles).await?;
        self.cache.invalidate_user(user_id).await;
        tracing::info!(user_id = %user_id, roles = ?roles, "Roles assigned");
        Ok(())
    }

    pub async fn revoke_roles(&self, user_id: &UserId, roles: &[Role]) -> Result<(), AccessError> {
        self.repository.remove_roles_for_user(user_id, roles).await?;
        self.cache.invalidate_user(user_id).await;
        tracing::info!(user_id = %user_id, roles = ?roles, "Roles revoked");
        Ok(())
    }

    /// Map permissions onto a role. Any user may hold the role, so every
    /// cached permission set is dropped.
    pub async fn grant_permissions(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError> {
        self.repository.add_permissions_for_role(role, codes).await?;
        self.cache.invalidate_all_permissions().await;
        tracing::info!(role = %role, codes = ?codes, "Permissions granted");
        Ok(())
    }

    pub async fn revoke_permissions(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError> {
        self.repository
            .remove_permissions_for_role(role, codes)
            .await?;
        self.cache.invalidate_all_permissions().await;
        tracing::info!(role = %role, codes = ?codes, "Permissions revoked");
        Ok(())
    }

    pub async fn invalidate_user(&self, user_id: &UserId) {
        self.cache.invalidate_user(user_id).await
    }
}
