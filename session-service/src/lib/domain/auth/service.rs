use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::task::TaskTracker;

use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::access::ports::AccessRepository;
use crate::domain::access::service::AccessService;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::LoginOutcome;
use crate::domain::auth::models::LogoutScope;
use crate::domain::auth::models::TokenTtls;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::mail::models::Mail;
use crate::domain::mail::ports::Mailer;
use crate::domain::session::assembler::SessionAssembler;
use crate::domain::session::models::Session;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::validate_token_plaintext;
use crate::domain::token::models::TokenHash;
use crate::domain::token::models::TokenScope;
use crate::domain::token::ports::TokenRepository;
use crate::domain::token::store::TokenStore;
use crate::domain::user::models::validate_full_name;
use crate::domain::user::models::validate_password_plaintext;
use crate::domain::user::models::validate_user;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginIdentifier;
use crate::domain::user::models::Password;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::domain::validation::ValidationErrors;

const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Domain service implementation for authentication and token lifecycle.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<UR, TR, AR>
where
    UR: UserRepository,
    TR: TokenRepository,
    AR: AccessRepository,
{
    users: Arc<UR>,
    tokens: Arc<TokenStore<TR>>,
    access: Arc<AccessService<AR>>,
    sessions: SessionAssembler<TR, AR>,
    mailer: Arc<dyn Mailer>,
    authenticator: Arc<auth::Authenticator>,
    ttls: TokenTtls,
    background: TaskTracker,
}

impl<UR, TR, AR> AuthService<UR, TR, AR>
where
    UR: UserRepository,
    TR: TokenRepository,
    AR: AccessRepository,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `tokens` - Token store shared with the reaper
    /// * `access` - Role/permission service
    /// * `mailer` - Outbound mail delivery
    /// * `ttls` - Token lifetimes per scope
    /// * `background` - Tracker for fire-and-forget mail tasks
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(
        users: Arc<UR>,
        tokens: Arc<TokenStore<TR>>,
        access: Arc<AccessService<AR>>,
        mailer: Arc<dyn Mailer>,
        ttls: TokenTtls,
        background: TaskTracker,
    ) -> Self {
        Self {
            users,
            sessions: SessionAssembler::new(Arc::clone(&tokens), Arc::clone(&access)),
            tokens,
            access,
            mailer,
            authenticator: Arc::new(auth::Authenticator::new()),
            ttls,
            background,
        }
    }

    async fn hash_password(&self, plaintext: String) -> Result<String, AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        let hash = tokio::task::spawn_blocking(move || authenticator.hash_password(&plaintext))
            .await
            .map_err(|e| AuthError::Unknown(format!("Password hashing task failed: {}", e)))??;
        Ok(hash)
    }

    async fn verify_password(
        &self,
        plaintext: String,
        stored_hash: Option<String>,
    ) -> Result<(), AuthError> {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || {
            authenticator.verify_credentials(&plaintext, stored_hash.as_deref())
        })
        .await
        .map_err(|e| AuthError::Unknown(format!("Password verification task failed: {}", e)))??;
        Ok(())
    }

    /// Issue a refresh and an authentication token and stamp the login.
    async fn start_session(&self, mut user: User) -> Result<LoginOutcome, AuthError> {
        let refresh_token = self
            .tokens
            .issue(user.id, self.ttls.refresh, TokenScope::Refresh)
            .await?;
        let authentication_token = self
            .tokens
            .issue(user.id, self.ttls.authentication, TokenScope::Authentication)
            .await?;

        user.last_login_at = Some(self.tokens.now());
        let user = self.users.update(user).await?;

        Ok(LoginOutcome {
            user,
            authentication_token,
            refresh_token,
        })
    }

    async fn find_by_identifier(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<User>, AuthError> {
        let user = match identifier {
            LoginIdentifier::Email(email) => self.users.find_by_email(email).await?,
            LoginIdentifier::Username(username) => self.users.find_by_username(username).await?,
        };
        Ok(user)
    }

    async fn find_by_email_field(&self, email: &str, missing: &str) -> Result<User, AuthError> {
        let email = EmailAddress::new(email.to_string())
            .map_err(|e| ValidationErrors::single("email", e.to_string()))?;

        self.users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ValidationErrors::single("email", missing).into())
    }

    /// Resolve a one-shot token presented in a request body.
    async fn consume_owner(&self, plaintext: &str, scope: TokenScope) -> Result<User, AuthError> {
        let (_, user) = self
            .tokens
            .resolve(plaintext, scope)
            .await
            .map_err(|e| match e {
                TokenError::NotFound => {
                    AuthError::Validation(ValidationErrors::single("token", INVALID_TOKEN_MESSAGE))
                }
                other => AuthError::from(other),
            })?;
        Ok(user)
    }

    fn send_in_background(&self, recipient: String, mail: Mail) {
        let mailer = Arc::clone(&self.mailer);
        self.background.spawn(async move {
            if let Err(e) = mailer.send(&recipient, &mail).await {
                tracing::error!(
                    template = mail.template_name(),
                    error = %e,
                    "Failed to deliver mail"
                );
            }
        });
    }
}

#[async_trait]
impl<UR, TR, AR> AuthServicePort for AuthService<UR, TR, AR>
where
    UR: UserRepository,
    TR: TokenRepository,
    AR: AccessRepository,
{
    async fn register_user(
        &self,
        command: RegisterUserCommand,
    ) -> Result<LoginOutcome, AuthError> {
        let mut errors = ValidationErrors::new();
        let username = Username::new(command.username)
            .map_err(|e| errors.add("username", e.to_string()))
            .ok();
        let email = EmailAddress::new(command.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();
        validate_full_name(&mut errors, &command.full_name);
        validate_password_plaintext(&mut errors, &command.password);

        let (Some(username), Some(email)) = (username, email) else {
            return Err(errors.into());
        };
        errors.into_result()?;

        let hash = self.hash_password(command.password.clone()).await?;
        let mut password = Password::default();
        password.set(command.password, hash);

        let user = User {
            id: UserId::new(),
            full_name: command.full_name,
            username,
            email,
            password,
            activated: false,
            version: 1,
            last_login_at: None,
            created_at: self.tokens.now(),
        };

        let mut errors = ValidationErrors::new();
        validate_user(&mut errors, &user);
        errors.into_result()?;

        let user = self.users.create(user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        let activation_token = self
            .tokens
            .issue(user.id, self.ttls.activation, TokenScope::Activation)
            .await?;
        self.send_in_background(
            user.email.to_string(),
            Mail::UserWelcome {
                full_name: user.full_name.clone(),
                activation_token: activation_token.plaintext,
            },
        );

        self.start_session(user).await
    }

    async fn authenticate(&self, authorization: Option<&str>) -> Result<Session, AuthError> {
        self.sessions.assemble(authorization).await
    }

    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError> {
        let mut errors = ValidationErrors::new();
        let identifier = LoginIdentifier::parse(&command.identifier);
        if let Err(message) = &identifier {
            errors.add("username_or_email", message.clone());
        }
        errors.check(
            !command.password.is_empty(),
            "password",
            "Password must be provided",
        );
        let identifier = match identifier {
            Ok(identifier) if errors.is_empty() => identifier,
            _ => return Err(errors.into()),
        };

        let user = self.find_by_identifier(&identifier).await?;
        let stored_hash = user
            .as_ref()
            .and_then(|u| u.password.hash().map(str::to_string));

        if let Err(e) = self.verify_password(command.password, stored_hash).await {
            tracing::debug!(identifier = ?identifier, "Login rejected");
            return Err(e);
        }
        let user = user.ok_or(AuthError::InvalidCredentials)?;

        let outcome = self.start_session(user).await?;
        tracing::info!(user_id = %outcome.user.id, "User logged in");
        Ok(outcome)
    }

    async fn refresh(&self, refresh_token: Option<&str>) -> Result<LoginOutcome, AuthError> {
        let plaintext = refresh_token.ok_or(AuthError::InvalidCredentials)?;

        let mut errors = ValidationErrors::new();
        validate_token_plaintext(&mut errors, plaintext);
        errors.into_result()?;

        let hash = TokenHash::from_plaintext(plaintext);
        let (_, user) = self
            .tokens
            .resolve_owner(&hash, TokenScope::Refresh)
            .await
            .map_err(|e| match e {
                TokenError::NotFound => AuthError::InvalidCredentials,
                other => AuthError::from(other),
            })?;

        // A concurrent rotation may have consumed the token since the lookup.
        if self.tokens.delete_by_hash(&hash).await? == 0 {
            tracing::warn!(user_id = %user.id, "Refresh token already rotated");
            return Err(AuthError::InvalidCredentials);
        }

        let outcome = self.start_session(user).await?;
        tracing::info!(user_id = %outcome.user.id, "Refresh token rotated");
        Ok(outcome)
    }

    async fn logout(
        &self,
        session: &Session,
        scope: LogoutScope,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        session.require_authenticated()?;

        let user_id = session.user.id;
        let refresh_hash = refresh_token
            .filter(|plaintext| auth::token::is_well_formed(plaintext))
            .map(TokenHash::from_plaintext);
        let authentication_hash = session.token.as_ref().map(|token| *token.hash());

        match scope {
            LogoutScope::Local => {
                if let Some(hash) = &refresh_hash {
                    self.tokens.delete_by_hash(hash).await?;
                }
                if let Some(hash) = &authentication_hash {
                    self.tokens.delete_by_hash(hash).await?;
                }
            }
            LogoutScope::Global => {
                self.tokens
                    .delete_all_for_user(TokenScope::Refresh, &user_id)
                    .await?;
                self.tokens
                    .delete_all_for_user(TokenScope::Authentication, &user_id)
                    .await?;
            }
            LogoutScope::Others => {
                for (scope, keep) in [
                    (TokenScope::Refresh, refresh_hash),
                    (TokenScope::Authentication, authentication_hash),
                ] {
                    match keep {
                        Some(hash) => {
                            self.tokens
                                .delete_all_for_user_except(scope, &user_id, &hash)
                                .await?
                        }
                        None => self.tokens.delete_all_for_user(scope, &user_id).await?,
                    };
                }
            }
        }

        self.access.invalidate_user(&user_id).await;
        tracing::info!(user_id = %user_id, scope = ?scope, "User logged out");
        Ok(())
    }

    async fn request_activation_token(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .find_by_email_field(email, "No matching email address found")
            .await?;
        if user.activated {
            return Err(ValidationErrors::single(
                "email",
                "Your account has already been activated",
            )
            .into());
        }

        let token = self
            .tokens
            .issue(user.id, self.ttls.activation, TokenScope::Activation)
            .await?;
        self.send_in_background(
            user.email.to_string(),
            Mail::ActivationToken {
                username: user.username.to_string(),
                activation_token: token.plaintext,
            },
        );
        Ok(())
    }

    async fn request_password_reset_token(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .find_by_email_field(email, "No matching account found")
            .await?;
        if !user.activated {
            return Err(ValidationErrors::single(
                "email",
                "Your account must be activated to reset password",
            )
            .into());
        }

        let token = self
            .tokens
            .issue(user.id, self.ttls.password_reset, TokenScope::PasswordReset)
            .await?;
        self.send_in_background(
            user.email.to_string(),
            Mail::PasswordResetToken {
                password_reset_token: token.plaintext,
            },
        );
        Ok(())
    }

    async fn activate_user(&self, token: &str) -> Result<User, AuthError> {
        let mut errors = ValidationErrors::new();
        validate_token_plaintext(&mut errors, token);
        errors.into_result()?;

        let mut user = self.consume_owner(token, TokenScope::Activation).await?;
        user.activated = true;
        let user = self.users.update(user).await?;

        self.tokens
            .delete_all_for_user(TokenScope::Activation, &user.id)
            .await?;

        tracing::info!(user_id = %user.id, "User activated");
        Ok(user)
    }

    async fn reset_password(&self, token: &str, password: &str) -> Result<(), AuthError> {
        let mut errors = ValidationErrors::new();
        validate_token_plaintext(&mut errors, token);
        validate_password_plaintext(&mut errors, password);
        errors.into_result()?;

        let mut user = self.consume_owner(token, TokenScope::PasswordReset).await?;
        let hash = self.hash_password(password.to_string()).await?;
        user.password.set(password.to_string(), hash);
        let user = self.users.update(user).await?;

        self.tokens
            .delete_all_for_user(TokenScope::PasswordReset, &user.id)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn assign_roles(
        &self,
        user_id: &UserId,
        roles: Vec<Role>,
    ) -> Result<Vec<Role>, AuthError> {
        if roles.is_empty() {
            return Err(ValidationErrors::single("roles", "Roles must be provided").into());
        }
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.access.assign_roles(user_id, &roles).await?;
        Ok(self.access.roles_for_user(user_id).await?)
    }

    async fn revoke_roles(
        &self,
        user_id: &UserId,
        roles: Vec<Role>,
    ) -> Result<Vec<Role>, AuthError> {
        if roles.is_empty() {
            return Err(ValidationErrors::single("roles", "Roles must be provided").into());
        }
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        self.access.revoke_roles(user_id, &roles).await?;
        Ok(self.access.roles_for_user(user_id).await?)
    }

    async fn grant_permissions(
        &self,
        role: &Role,
        codes: Vec<PermissionCode>,
    ) -> Result<(), AuthError> {
        if codes.is_empty() {
            return Err(
                ValidationErrors::single("permissions", "Permissions must be provided").into(),
            );
        }
        Ok(self.access.grant_permissions(role, &codes).await?)
    }

    async fn revoke_permissions(
        &self,
        role: &Role,
        codes: Vec<PermissionCode>,
    ) -> Result<(), AuthError> {
        if codes.is_empty() {
            return Err(
                ValidationErrors::single("permissions", "Permissions must be provided").into(),
            );
        }
        Ok(self.access.revoke_permissions(role, &codes).await?)
    }
}
