use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::token::errors::TokenError;
use crate::domain::user::models::UserId;
use crate::domain::validation::ValidationErrors;

/// Purpose a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    Activation,
    Authentication,
    Refresh,
    PasswordReset,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
            TokenScope::Refresh => "refresh",
            TokenScope::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenScope {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activation" => Ok(TokenScope::Activation),
            "authentication" => Ok(TokenScope::Authentication),
            "refresh" => Ok(TokenScope::Refresh),
            "password-reset" => Ok(TokenScope::PasswordReset),
            other => Err(TokenError::InvalidScope(other.to_string())),
        }
    }
}

/// SHA-256 digest of a token plaintext; the only form a token is stored in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHash([u8; auth::token::TOKEN_HASH_LENGTH]);

impl TokenHash {
    pub fn from_plaintext(plaintext: &str) -> Self {
        Self(auth::token::hash_token(plaintext))
    }

    /// Rebuild a digest read back from storage.
    ///
    /// # Errors
    /// * `DatabaseError` - Stored value is not 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TokenError> {
        <[u8; auth::token::TOKEN_HASH_LENGTH]>::try_from(bytes)
            .map(Self)
            .map_err(|_| TokenError::DatabaseError(format!("token hash of {} bytes", bytes.len())))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenHash(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Persisted form of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub hash: TokenHash,
    pub user_id: UserId,
    pub scope: TokenScope,
    pub expiry: DateTime<Utc>,
}

/// Token as handed to, or presented by, its owner.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub plaintext: String,
    pub record: TokenRecord,
}

impl Token {
    pub fn hash(&self) -> &TokenHash {
        &self.record.hash
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.record.expiry
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

/// Check the shape of a presented token, recording failures under `token`.
pub fn validate_token_plaintext(errors: &mut ValidationErrors, plaintext: &str) {
    errors.check(!plaintext.is_empty(), "token", "Token must be provided");
    errors.check(
        plaintext.len() == auth::token::TOKEN_LENGTH,
        "token",
        "Token must be 26 characters long",
    );
    errors.check(
        auth::token::is_well_formed(plaintext),
        "token",
        "Invalid or expired token",
    );
}
