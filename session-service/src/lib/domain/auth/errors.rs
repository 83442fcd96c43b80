use thiserror::Error;

use crate::domain::access::errors::AccessError;
use crate::domain::token::errors::TokenError;
use crate::domain::user::errors::UserError;
use crate::domain::validation::ValidationErrors;

/// Top-level error for authentication and session operations.
///
/// Lookups for credentials and tokens fail with the same variant whatever
/// the underlying cause, so responses never reveal which part was wrong.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Record not found")]
    NotFound,

    #[error("Edit conflict")]
    EditConflict,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or missing authentication token")]
    InvalidToken,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Account not activated")]
    InactiveAccount,

    #[error("Not permitted")]
    NotPermitted,

    #[error("Password error: {0}")]
    Password(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::Validation(errors)
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AuthError::NotFound,
            UserError::EditConflict(_) => AuthError::EditConflict,
            UserError::EmailAlreadyExists(_) => AuthError::Validation(ValidationErrors::single(
                "email",
                "A user with this email address already exists",
            )),
            UserError::UsernameAlreadyExists(_) => AuthError::Validation(
                ValidationErrors::single("username", "A user with this username already exists"),
            ),
            UserError::DatabaseError(msg) => AuthError::DatabaseError(msg),
            UserError::InvalidUserId(_)
            | UserError::InvalidUsername(_)
            | UserError::InvalidEmail(_)
            | UserError::Unknown(_) => AuthError::Unknown(err.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => AuthError::NotFound,
            TokenError::DatabaseError(msg) => AuthError::DatabaseError(msg),
            TokenError::InvalidScope(_) | TokenError::Unknown(_) => {
                AuthError::Unknown(err.to_string())
            }
        }
    }
}

impl From<AccessError> for AuthError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::RoleNotFound(_) | AccessError::PermissionNotFound(_) => {
                AuthError::NotFound
            }
            AccessError::RoleAlreadyAssigned(role) => AuthError::Validation(
                ValidationErrors::single("roles", format!("User already has the role {role}")),
            ),
            AccessError::PermissionAlreadyGranted(code) => {
                AuthError::Validation(ValidationErrors::single(
                    "permissions",
                    format!("Role already has the permission {code}"),
                ))
            }
            AccessError::DatabaseError(msg) => AuthError::DatabaseError(msg),
        }
    }
}

impl From<auth::AuthenticationError> for AuthError {
    fn from(err: auth::AuthenticationError) -> Self {
        match err {
            auth::AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
            auth::AuthenticationError::PasswordError(e) => AuthError::Password(e.to_string()),
        }
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Password(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
