use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Credential coordinator over the password hasher.
///
/// Keeps the "unknown principal" and "wrong password" paths at the same
/// cost so that login timing does not reveal which accounts exist.
pub struct Authenticator {
    password_hasher: PasswordHasher,
}

/// Credential verification errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Returns
    /// Authenticator backed by the default Argon2id hasher
    pub fn new() -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Arguments
    /// * `password` - Plaintext password
    ///
    /// # Returns
    /// Hashed password string
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against the stored hash of a principal, if any.
    ///
    /// When `stored_hash` is `None` the dummy hash is verified instead and
    /// the result is always `InvalidCredentials`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored hash of the matched principal
    ///
    /// # Errors
    /// * `InvalidCredentials` - No principal or password does not match
    /// * `PasswordError` - Stored hash is malformed
    pub fn verify_credentials(
        &self,
        password: &str,
        stored_hash: Option<&str>,
    ) -> Result<(), AuthenticationError> {
        let Some(stored_hash) = stored_hash else {
            self.password_hasher.verify_dummy(password);
            return Err(AuthenticationError::InvalidCredentials);
        };

        if self.password_hasher.verify(password, stored_hash)? {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new()
    }
}
