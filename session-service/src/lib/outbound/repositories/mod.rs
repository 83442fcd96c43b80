pub mod access;
pub mod token;
pub mod user;

pub use access::PostgresAccessRepository;
pub use token::PostgresTokenRepository;
pub use user::PostgresUserRepository;
