use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::validation::ValidationErrors;
use crate::user::errors::EmailError;
use crate::user::errors::UserIdError;
use crate::user::errors::UsernameError;

static ANONYMOUS_USER: LazyLock<Arc<User>> = LazyLock::new(|| {
    Arc::new(User {
        id: UserId(Uuid::nil()),
        full_name: String::new(),
        username: Username(String::new()),
        email: EmailAddress(String::new()),
        password: Password::default(),
        activated: false,
        version: 0,
        last_login_at: None,
        created_at: DateTime::<Utc>::UNIX_EPOCH,
    })
});

/// User aggregate entity.
///
/// Represents a registered account. The anonymous user is a shared
/// singleton recognised by identity, never by its field values.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub username: Username,
    pub email: EmailAddress,
    pub password: Password,
    pub activated: bool,
    pub version: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Shared anonymous user instance.
    pub fn anonymous() -> Arc<User> {
        Arc::clone(&ANONYMOUS_USER)
    }

    /// Whether `user` is the anonymous singleton.
    pub fn is_anonymous(user: &Arc<User>) -> bool {
        Arc::ptr_eq(user, &ANONYMOUS_USER)
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// 8-16 characters drawn from letters, digits, `.`, `_` and `-`, with no
/// leading, trailing or doubled `.`/`_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 16;

    /// Create a new valid username.
    ///
    /// # Arguments
    /// * `username` - Raw username string
    ///
    /// # Returns
    /// Validated Username value object
    ///
    /// # Errors
    /// * `Missing` - Username is blank
    /// * `TooShort` / `TooLong` - Length outside 8-16 characters
    /// * `InvalidCharacters` - Contains characters outside the allowed set
    /// * `InvalidBoundary` - Starts or ends with `.` or `_`
    /// * `ConsecutiveSeparators` - Contains `..`, `__`, `._` or `_.`
    pub fn new(username: String) -> Result<Self, UsernameError> {
        if username.trim().is_empty() {
            return Err(UsernameError::Missing);
        }

        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !Self::has_basic_shape(&username) {
            return Err(UsernameError::InvalidCharacters);
        }
        if username.starts_with(['.', '_']) || username.ends_with(['.', '_']) {
            return Err(UsernameError::InvalidBoundary);
        }
        if ["..", "__", "._", "_."]
            .iter()
            .any(|pair| username.contains(pair))
        {
            return Err(UsernameError::ConsecutiveSeparators);
        }

        Ok(Self(username))
    }

    /// Whether the input only uses characters a username may contain.
    pub fn has_basic_shape(candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `Missing` - Email is blank
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        if email.trim().is_empty() {
            return Err(EmailError::Missing);
        }
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|_| EmailError::InvalidFormat)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Password credential of a user.
///
/// The plaintext is only held between a password change and the
/// validation that precedes persisting it; it is never stored.
#[derive(Clone, Default)]
pub struct Password {
    plaintext: Option<String>,
    hash: Option<String>,
}

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 72;

    /// Credential loaded from storage.
    pub fn from_hash(hash: String) -> Self {
        Self {
            plaintext: None,
            hash: Some(hash),
        }
    }

    /// Replace the credential with a freshly hashed plaintext.
    pub fn set(&mut self, plaintext: String, hash: String) {
        self.plaintext = Some(plaintext);
        self.hash = Some(hash);
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn plaintext(&self) -> Option<&str> {
        self.plaintext.as_deref()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password").finish_non_exhaustive()
    }
}

/// Check password strength, recording failures under `password`.
pub fn validate_password_plaintext(errors: &mut ValidationErrors, password: &str) {
    let length = password.chars().count();
    errors.check(
        !password.trim().is_empty(),
        "password",
        "Password must be provided",
    );
    errors.check(
        length >= Password::MIN_LENGTH,
        "password",
        "Password must be at least 8 characters long",
    );
    errors.check(
        length <= Password::MAX_LENGTH,
        "password",
        "Password must not be more than 72 characters long",
    );
    errors.check(
        password.chars().any(|c| c.is_lowercase()),
        "password",
        "Password must have at least 1 lower-case character",
    );
    errors.check(
        password.chars().any(|c| c.is_uppercase()),
        "password",
        "Password must have at least 1 upper-case character",
    );
    errors.check(
        password.chars().any(|c| c.is_ascii_digit()),
        "password",
        "Password must have at least 1 numeric character",
    );
    errors.check(
        password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        "password",
        "Password must have at least 1 special character",
    );
}

pub fn validate_full_name(errors: &mut ValidationErrors, full_name: &str) {
    errors.check(
        !full_name.trim().is_empty(),
        "full_name",
        "Full name must be provided",
    );
    errors.check(
        full_name.chars().count() <= 32,
        "full_name",
        "Full name must not be more than 32 characters long",
    );
}

/// Validate a user before it is persisted.
///
/// # Panics
/// If the user carries no password hash. That can only happen when a code
/// path forgot to set the credential, never because of client input.
pub fn validate_user(errors: &mut ValidationErrors, user: &User) {
    validate_full_name(errors, &user.full_name);

    if let Some(plaintext) = user.password.plaintext() {
        validate_password_plaintext(errors, plaintext);
    }

    if user.password.hash().is_none() {
        panic!("missing password hash for user {}", user.id);
    }
}

/// Identifier accepted at login: either an email address or a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(EmailAddress),
    Username(Username),
}

impl LoginIdentifier {
    /// Decide which lookup an identifier takes.
    ///
    /// Anything containing `@` is treated as an email address, anything else
    /// with username characters as a username.
    ///
    /// # Errors
    /// Message describing why the identifier is unusable
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Err("Username or email must be provided".to_string());
        }
        if raw.contains('@') {
            return EmailAddress::new(raw.to_string())
                .map(LoginIdentifier::Email)
                .map_err(|e| e.to_string());
        }
        if Username::has_basic_shape(raw) {
            return Username::new(raw.to_string())
                .map(LoginIdentifier::Username)
                .map_err(|e| e.to_string());
        }
        Err("Invalid username or email".to_string())
    }
}

/// Command to register a new account
#[derive(Debug, Clone)]
pub struct RegisterUserCommand {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(password: Password) -> User {
        User {
            id: UserId::new(),
            full_name: "Ada Lovelace".to_string(),
            username: Username::new("ada.lovelace".to_string()).expect("valid username"),
            email: EmailAddress::new("ada@example.com".to_string()).expect("valid email"),
            password,
            activated: false,
            version: 1,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_username_rules() {
        assert!(Username::new("ada.lovelace".to_string()).is_ok());
        assert!(Username::new("ada-love_1".to_string()).is_ok());
        assert_eq!(
            Username::new("   ".to_string()),
            Err(UsernameError::Missing)
        );
        assert_eq!(
            Username::new("ada".to_string()),
            Err(UsernameError::TooShort { min: 8 })
        );
        assert_eq!(
            Username::new("a".repeat(17)),
            Err(UsernameError::TooLong { max: 16 })
        );
        assert_eq!(
            Username::new("ada lovelace".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
        assert_eq!(
            Username::new("_adalovelace".to_string()),
            Err(UsernameError::InvalidBoundary)
        );
        assert_eq!(
            Username::new("ada._lovelace".to_string()),
            Err(UsernameError::ConsecutiveSeparators)
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(EmailAddress::new("ada@example.com".to_string()).is_ok());
        assert_eq!(EmailAddress::new("".to_string()), Err(EmailError::Missing));
        assert_eq!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat)
        );
    }

    #[test]
    fn test_password_strength_collects_first_failure() {
        let mut errors = ValidationErrors::new();
        validate_password_plaintext(&mut errors, "short");
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters long")
        );

        let mut errors = ValidationErrors::new();
        validate_password_plaintext(&mut errors, "alllowercase1!");
        assert_eq!(
            errors.get("password"),
            Some("Password must have at least 1 upper-case character")
        );

        let mut errors = ValidationErrors::new();
        validate_password_plaintext(&mut errors, "Pa55word!");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_validate_user_checks_plaintext() {
        let mut password = Password::default();
        password.set("weak".to_string(), "$argon2id$stub".to_string());

        let mut errors = ValidationErrors::new();
        validate_user(&mut errors, &user_with(password));
        assert!(errors.get("password").is_some());
        assert!(errors.get("full_name").is_none());
    }

    #[test]
    #[should_panic(expected = "missing password hash")]
    fn test_validate_user_panics_without_hash() {
        let mut errors = ValidationErrors::new();
        validate_user(&mut errors, &user_with(Password::default()));
    }

    #[test]
    fn test_anonymous_is_identity_based() {
        let anonymous = User::anonymous();
        assert!(User::is_anonymous(&anonymous));

        let lookalike = Arc::new((*anonymous).clone());
        assert!(!User::is_anonymous(&lookalike));
    }

    #[test]
    fn test_login_identifier_sniffing() {
        assert!(matches!(
            LoginIdentifier::parse("ada@example.com"),
            Ok(LoginIdentifier::Email(_))
        ));
        assert!(matches!(
            LoginIdentifier::parse("ada.lovelace"),
            Ok(LoginIdentifier::Username(_))
        ));
        assert_eq!(
            LoginIdentifier::parse(""),
            Err("Username or email must be provided".to_string())
        );
        assert_eq!(
            LoginIdentifier::parse("ada lovelace!"),
            Err("Invalid username or email".to_string())
        );
        assert_eq!(
            LoginIdentifier::parse("ada"),
            Err("Username must be at least 8 characters long".to_string())
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let mut password = Password::default();
        password.set("Sup3r$ecret".to_string(), "hash".to_string());
        assert!(!format!("{password:?}").contains("Sup3r"));
    }
}
