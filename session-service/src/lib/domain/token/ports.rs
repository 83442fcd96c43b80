use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::token::errors::TokenError;
use crate::domain::token::models::TokenHash;
use crate::domain::token::models::TokenRecord;
use crate::domain::token::models::TokenScope;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Persistence operations for tokens.
///
/// Deletions report how many rows they removed; removing nothing is not an error.
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Persist a token record.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, record: &TokenRecord) -> Result<(), TokenError>;

    /// Resolve a token hash to its record and owner.
    ///
    /// Only matches when the scope agrees and `expiry > now`.
    ///
    /// # Arguments
    /// * `hash` - Token digest
    /// * `scope` - Required scope
    /// * `now` - Reference time for expiry
    ///
    /// # Returns
    /// Record and owning user, or None
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_with_owner(
        &self,
        hash: &TokenHash,
        scope: TokenScope,
        now: DateTime<Utc>,
    ) -> Result<Option<(TokenRecord, User)>, TokenError>;

    /// Delete a single token by digest.
    async fn delete_by_hash(&self, hash: &TokenHash) -> Result<u64, TokenError>;

    /// Delete every token of `scope` owned by `user_id`.
    async fn delete_all_for_user(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<u64, TokenError>;

    /// Delete every token of `scope` owned by `user_id` except `keep`.
    async fn delete_all_for_user_except(
        &self,
        scope: TokenScope,
        user_id: &UserId,
        keep: &TokenHash,
    ) -> Result<u64, TokenError>;

    /// Delete every token whose expiry is at or before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, TokenError>;
}
