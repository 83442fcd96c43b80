//! Authentication utilities library
//!
//! Provides the credential primitives the session service builds on:
//! - Password hashing (Argon2id) with a dummy-hash path for unknown principals
//! - Opaque token generation and SHA-256 digests
//! - Credential verification coordination
//!
//! Persistence, scopes and expiry live in the service; this crate only deals
//! with secrets.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Opaque Tokens
//! ```
//! use auth::token;
//!
//! let plaintext = token::generate_token();
//! assert!(token::is_well_formed(&plaintext));
//! let digest = token::hash_token(&plaintext);
//! assert_eq!(digest.len(), 32);
//! ```
//!
//! ## Login
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new();
//! let hash = auth.hash_password("password123").unwrap();
//!
//! auth.verify_credentials("password123", Some(&hash)).unwrap();
//! assert!(auth.verify_credentials("password123", None).is_err());
//! ```

pub mod authenticator;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::DUMMY_PASSWORD_HASH;

