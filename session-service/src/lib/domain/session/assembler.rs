use std::sync::Arc;

use crate::domain::access::models::PermissionMap;
use crate::domain::access::ports::AccessRepository;
use crate::domain::access::service::AccessService;
use crate::domain::auth::errors::AuthError;
use crate::domain::session::models::Session;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::TokenScope;
use crate::domain::token::ports::TokenRepository;
use crate::domain::token::store::TokenStore;

/// Turns an `Authorization` header into a [`Session`].
pub struct SessionAssembler<TR, AR>
where
    TR: TokenRepository,
    AR: AccessRepository,
{
    tokens: Arc<TokenStore<TR>>,
    access: Arc<AccessService<AR>>,
}

impl<TR, AR> SessionAssembler<TR, AR>
where
    TR: TokenRepository,
    AR: AccessRepository,
{
    pub fn new(tokens: Arc<TokenStore<TR>>, access: Arc<AccessService<AR>>) -> Self {
        Self { tokens, access }
    }

    /// Authenticate a request.
    ///
    /// A missing or empty header yields the anonymous session. Otherwise the
    /// header must read `Bearer <token>` with a well-formed token that
    /// resolves in the authentication scope.
    ///
    /// # Arguments
    /// * `authorization` - Raw `Authorization` header value
    ///
    /// # Returns
    /// Session with the owner, presented token, roles and permissions
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed header, malformed token, or no live token
    /// * `DatabaseError` - Token or role/permission lookup failed
    pub async fn assemble(&self, authorization: Option<&str>) -> Result<Session, AuthError> {
        let header = match authorization {
            None | Some("") => return Ok(Session::anonymous()),
            Some(header) => header,
        };

        let plaintext = bearer_token(header).ok_or(AuthError::InvalidToken)?;
        if !auth::token::is_well_formed(plaintext) {
            return Err(AuthError::InvalidToken);
        }

        let (token, user) = self
            .tokens
            .resolve(plaintext, TokenScope::Authentication)
            .await
            .map_err(|e| match e {
                TokenError::NotFound => AuthError::InvalidToken,
                other => AuthError::from(other),
            })?;

        let permissions: PermissionMap = self
            .access
            .permissions_for_user(&user.id)
            .await?
            .into_iter()
            .collect();
        let roles = self.access.roles_for_user(&user.id).await?;

        Ok(Session {
            user: Arc::new(user),
            token: Some(token),
            roles,
            permissions,
        })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}
