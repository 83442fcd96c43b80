use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::clock::Clock;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenHash;
use crate::domain::token::models::TokenRecord;
use crate::domain::token::models::TokenScope;
use crate::domain::token::ports::TokenRepository;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Issues, resolves and revokes opaque tokens.
///
/// Plaintexts leave this type exactly once, inside the [`Token`] returned by
/// [`TokenStore::issue`]; everything else works on digests.
pub struct TokenStore<TR>
where
    TR: TokenRepository,
{
    repository: Arc<TR>,
    clock: Arc<dyn Clock>,
}

impl<TR> TokenStore<TR>
where
    TR: TokenRepository,
{
    /// Create a new token store.
    ///
    /// # Arguments
    /// * `repository` - Token persistence implementation
    /// * `clock` - Time source for expiry
    ///
    /// # Returns
    /// Configured token store
    pub fn new(repository: Arc<TR>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Current time from the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issue a new token for a user.
    ///
    /// # Arguments
    /// * `user_id` - Owner
    /// * `ttl` - Lifetime from now
    /// * `scope` - Purpose of the token
    ///
    /// # Returns
    /// Token carrying the plaintext for one-time transmission
    ///
    /// # Errors
    /// * `DatabaseError` - Record could not be persisted
    pub async fn issue(
        &self,
        user_id: UserId,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, TokenError> {
        let plaintext = auth::token::generate_token();
        let record = TokenRecord {
            hash: TokenHash::from_plaintext(&plaintext),
            user_id,
            scope,
            expiry: self.clock.now() + ttl,
        };

        self.repository.insert(&record).await?;

        tracing::debug!(
            user_id = %user_id,
            scope = %scope,
            expiry = %record.expiry,
            "Token issued"
        );

        Ok(Token { plaintext, record })
    }

    /// Resolve a digest to its record and owner.
    ///
    /// # Arguments
    /// * `hash` - Token digest
    /// * `scope` - Scope the caller requires
    ///
    /// # Returns
    /// Matching record and owner
    ///
    /// # Errors
    /// * `NotFound` - Unknown, wrong scope or expired
    /// * `DatabaseError` - Lookup failed
    pub async fn resolve_owner(
        &self,
        hash: &TokenHash,
        scope: TokenScope,
    ) -> Result<(TokenRecord, User), TokenError> {
        self.repository
            .find_with_owner(hash, scope, self.clock.now())
            .await?
            .ok_or(TokenError::NotFound)
    }

    /// Resolve a presented plaintext, echoing it back inside the token.
    pub async fn resolve(
        &self,
        plaintext: &str,
        scope: TokenScope,
    ) -> Result<(Token, User), TokenError> {
        let hash = TokenHash::from_plaintext(plaintext);
        let (record, user) = self.resolve_owner(&hash, scope).await?;
        let token = Token {
            plaintext: plaintext.to_string(),
            record,
        };
        Ok((token, user))
    }

    /// Delete one token by digest.
    ///
    /// # Arguments
    /// * `hash` - Token digest
    ///
    /// # Returns
    /// Number of rows removed, zero when the token was already gone
    ///
    /// # Errors
    /// * `DatabaseError` - Delete failed
    pub async fn delete_by_hash(&self, hash: &TokenHash) -> Result<u64, TokenError> {
        self.repository.delete_by_hash(hash).await
    }

    /// Delete every token of one scope owned by a user.
    ///
    /// # Arguments
    /// * `scope` - Scope to clear
    /// * `user_id` - Owner
    ///
    /// # Errors
    /// * `DatabaseError` - Delete failed
    pub async fn delete_all_for_user(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<u64, TokenError> {
        self.repository.delete_all_for_user(scope, user_id).await
    }

    /// Delete a user's tokens of one scope, sparing `keep`.
    ///
    /// # Arguments
    /// * `scope` - Scope to clear
    /// * `user_id` - Owner
    /// * `keep` - Digest that survives
    ///
    /// # Errors
    /// * `DatabaseError` - Delete failed
    pub async fn delete_all_for_user_except(
        &self,
        scope: TokenScope,
        user_id: &UserId,
        keep: &TokenHash,
    ) -> Result<u64, TokenError> {
        self.repository
            .delete_all_for_user_except(scope, user_id, keep)
            .await
    }

    /// Delete every token whose expiry is at or before the clock's now.
    ///
    /// # Errors
    /// * `DatabaseError` - Delete failed
    pub async fn delete_expired(&self) -> Result<u64, TokenError> {
        self.repository.delete_expired(self.clock.now()).await
    }
}
