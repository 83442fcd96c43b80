use thiserror::Error;

/// Error for token store operations
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// Nonexistent, wrong scope and expired tokens all land here.
    #[error("Token not found")]
    NotFound,

    #[error("Invalid token scope: {0}")]
    InvalidScope(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
