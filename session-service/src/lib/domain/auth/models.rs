use std::str::FromStr;

use chrono::Duration;

use crate::domain::token::models::Token;
use crate::domain::user::models::User;
use crate::domain::validation::ValidationErrors;

/// Lifetimes of issued tokens per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub authentication: Duration,
    pub refresh: Duration,
    pub activation: Duration,
    pub password_reset: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            authentication: Duration::hours(1),
            refresh: Duration::days(15),
            activation: Duration::hours(12),
            password_reset: Duration::minutes(45),
        }
    }
}

/// Which tokens a logout revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutScope {
    /// Only the tokens presented with the request.
    Local,
    /// Every authentication and refresh token of the user.
    Global,
    /// Every authentication and refresh token except the presented ones.
    Others,
}

impl FromStr for LogoutScope {
    type Err = ValidationErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(LogoutScope::Local),
            "global" => Ok(LogoutScope::Global),
            "others" => Ok(LogoutScope::Others),
            _ => Err(ValidationErrors::single("scope", "invalid scope")),
        }
    }
}

/// Credentials submitted at login.
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub identifier: String,
    pub password: String,
}

/// Result of a login, registration or refresh.
///
/// The refresh token travels back in a cookie, the authentication token in
/// the response body.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub authentication_token: Token,
    pub refresh_token: Token,
}
