use async_trait::async_trait;

use crate::domain::access::errors::AccessError;
use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::user::models::UserId;

/// Persistence operations for roles and permissions.
#[async_trait]
pub trait AccessRepository: Send + Sync + 'static {
    /// Roles held by a user.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn roles_for_user(&self, user_id: &UserId) -> Result<Vec<Role>, AccessError>;

    /// Distinct permission codes reachable through a user's roles.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn permissions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PermissionCode>, AccessError>;

    /// Assign roles to a user.
    ///
    /// # Errors
    /// * `RoleNotFound` - One of the roles does not exist
    /// * `RoleAlreadyAssigned` - User already holds one of the roles
    /// * `DatabaseError` - Database operation failed
    async fn add_roles_for_user(&self, user_id: &UserId, roles: &[Role])
        -> Result<(), AccessError>;

    /// Revoke roles from a user.
    ///
    /// # Errors
    /// * `RoleNotFound` - User held none of the roles
    /// * `DatabaseError` - Database operation failed
    async fn remove_roles_for_user(
        &self,
        user_id: &UserId,
        roles: &[Role],
    ) -> Result<(), AccessError>;

    /// Map permissions onto a role.
    ///
    /// # Errors
    /// * `RoleNotFound` - Role does not exist
    /// * `PermissionNotFound` - One of the codes does not exist
    /// * `PermissionAlreadyGranted` - Role already has one of the codes
    /// * `DatabaseError` - Database operation failed
    async fn add_permissions_for_role(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError>;

    /// Unmap permissions from a role.
    ///
    /// # Errors
    /// * `PermissionNotFound` - Role had none of the codes
    /// * `DatabaseError` - Database operation failed
    async fn remove_permissions_for_role(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError>;
}
