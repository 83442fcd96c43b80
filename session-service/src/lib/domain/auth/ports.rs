use async_trait::async_trait;

use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::LoginOutcome;
use crate::domain::auth::models::LogoutScope;
use crate::domain::session::models::Session;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Port for authentication and session operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register an account and log it in.
    ///
    /// # Arguments
    /// * `command` - Raw registration fields
    ///
    /// # Returns
    /// Login outcome for the new user
    ///
    /// # Errors
    /// * `Validation` - Invalid fields, or email/username already taken
    /// * `DatabaseError` - Persistence failed
    async fn register_user(&self, command: RegisterUserCommand)
        -> Result<LoginOutcome, AuthError>;

    /// Build the session of a request from its `Authorization` header.
    ///
    /// # Errors
    /// * `InvalidToken` - Header present but not a live bearer token
    /// * `DatabaseError` - Lookup failed
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Session, AuthError>;

    /// Exchange credentials for an authentication and a refresh token.
    ///
    /// # Errors
    /// * `Validation` - Identifier or password missing or malformed
    /// * `InvalidCredentials` - Unknown account or wrong password
    /// * `EditConflict` - User changed concurrently
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError>;

    /// Rotate a refresh token.
    ///
    /// The presented token is deleted; reusing it afterwards fails.
    ///
    /// # Arguments
    /// * `refresh_token` - Plaintext from the refresh cookie
    ///
    /// # Errors
    /// * `InvalidCredentials` - Missing, unknown, expired or already rotated
    /// * `Validation` - Token is malformed
    async fn refresh(&self, refresh_token: Option<&str>) -> Result<LoginOutcome, AuthError>;

    /// Revoke tokens of the session's user.
    ///
    /// # Arguments
    /// * `session` - Authenticated session
    /// * `scope` - Which tokens to revoke
    /// * `refresh_token` - Plaintext from the refresh cookie, if any
    ///
    /// # Errors
    /// * `AuthenticationRequired` - Session is anonymous
    /// * `DatabaseError` - Deletion failed
    async fn logout(
        &self,
        session: &Session,
        scope: LogoutScope,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Mail a fresh activation token to an inactive account.
    ///
    /// # Errors
    /// * `Validation` - Unknown email or account already active
    async fn request_activation_token(&self, email: &str) -> Result<(), AuthError>;

    /// Mail a password reset token to an active account.
    ///
    /// # Errors
    /// * `Validation` - Unknown email or account not active
    async fn request_password_reset_token(&self, email: &str) -> Result<(), AuthError>;

    /// Consume an activation token.
    ///
    /// # Returns
    /// Activated user
    ///
    /// # Errors
    /// * `Validation` - Token malformed, unknown or expired
    /// * `EditConflict` - User changed concurrently
    async fn activate_user(&self, token: &str) -> Result<User, AuthError>;

    /// Consume a password reset token and set a new password.
    ///
    /// # Errors
    /// * `Validation` - Token or password invalid
    /// * `EditConflict` - User changed concurrently
    async fn reset_password(&self, token: &str, password: &str) -> Result<(), AuthError>;

    /// Assign roles to a user.
    ///
    /// # Returns
    /// Roles held afterwards
    ///
    /// # Errors
    /// * `NotFound` - Unknown user or role
    /// * `Validation` - User already holds one of the roles
    async fn assign_roles(&self, user_id: &UserId, roles: Vec<Role>)
        -> Result<Vec<Role>, AuthError>;

    /// Revoke roles from a user.
    ///
    /// # Returns
    /// Roles held afterwards
    ///
    /// # Errors
    /// * `NotFound` - Unknown user, or none of the roles were held
    async fn revoke_roles(&self, user_id: &UserId, roles: Vec<Role>)
        -> Result<Vec<Role>, AuthError>;

    /// Map permissions onto a role.
    ///
    /// # Errors
    /// * `NotFound` - Unknown role or permission
    /// * `Validation` - Role already has one of the permissions
    async fn grant_permissions(
        &self,
        role: &Role,
        codes: Vec<PermissionCode>,
    ) -> Result<(), AuthError>;

    /// Unmap permissions from a role.
    ///
    /// # Errors
    /// * `NotFound` - Role had none of the permissions
    async fn revoke_permissions(
        &self,
        role: &Role,
        codes: Vec<PermissionCode>,
    ) -> Result<(), AuthError>;
}
