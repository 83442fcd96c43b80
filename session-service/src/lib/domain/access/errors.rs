use thiserror::Error;

/// Error for role and permission operations
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Role already assigned: {0}")]
    RoleAlreadyAssigned(String),

    #[error("Permission not found: {0}")]
    PermissionNotFound(String),

    #[error("Permission already granted: {0}")]
    PermissionAlreadyGranted(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
