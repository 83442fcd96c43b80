use std::sync::Arc;

use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::PermissionMap;
use crate::domain::access::models::Role;
use crate::domain::auth::errors::AuthError;
use crate::domain::token::models::Token;
use crate::domain::user::models::User;

/// Authorization context of a single request.
///
/// Rebuilt for every request and dropped with it.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: Arc<User>,
    /// Bearer token as presented; None for anonymous sessions.
    pub token: Option<Token>,
    pub roles: Vec<Role>,
    pub permissions: PermissionMap,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            user: User::anonymous(),
            token: None,
            roles: Vec::new(),
            permissions: PermissionMap::default(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        User::is_anonymous(&self.user)
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// # Errors
    /// * `AuthenticationRequired` - Session is anonymous
    pub fn require_authenticated(&self) -> Result<(), AuthError> {
        if self.is_anonymous() {
            return Err(AuthError::AuthenticationRequired);
        }
        Ok(())
    }

    /// # Errors
    /// * `AuthenticationRequired` - Session is anonymous
    /// * `InactiveAccount` - User has not activated the account
    pub fn require_activated(&self) -> Result<(), AuthError> {
        self.require_authenticated()?;
        if !self.user.activated {
            return Err(AuthError::InactiveAccount);
        }
        Ok(())
    }

    /// Grant when the session holds every code in `required`.
    ///
    /// The superadmin role is checked as a role and passes regardless of
    /// its mapped permissions.
    ///
    /// Activation is a separate gate and is not checked here. An anonymous
    /// session holds no codes, so it fails any non-empty requirement.
    ///
    /// # Errors
    /// * `NotPermitted` - A required code is missing
    pub fn require_permissions(&self, required: &[PermissionCode]) -> Result<(), AuthError> {
        if self.has_role(&Role::SUPERADMIN) || self.permissions.contains_all(required) {
            return Ok(());
        }
        Err(AuthError::NotPermitted)
    }
}
