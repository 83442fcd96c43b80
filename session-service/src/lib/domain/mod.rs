pub mod access;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod errors;
pub mod mail;
pub mod session;
pub mod token;
pub mod user;
pub mod validation;
