use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username must be provided")]
    Missing,

    #[error("Username must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("Username must not be more than {max} characters long")]
    TooLong { max: usize },

    #[error("Username must contain only alphanumeric characters, dots, underscores and dashes")]
    InvalidCharacters,

    #[error(r#"Username must not start or end with "." or "_""#)]
    InvalidBoundary,

    #[error(r#"Username must not contain consecutive "." or "_" or a combination of those"#)]
    ConsecutiveSeparators,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email must be provided")]
    Missing,

    #[error("Email must be a valid email address")]
    InvalidFormat,
}

/// Top-level error for all user-related operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Edit conflict on user {0}")]
    EditConflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        UserError::Unknown(err.to_string())
    }
}
