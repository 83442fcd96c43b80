pub mod argon2;
pub mod errors;

pub use argon2::PasswordHasher;
pub use argon2::DUMMY_PASSWORD_HASH;
pub use errors::PasswordError;
