use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserRow;
use super::user::USER_COLUMNS;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::TokenHash;
use crate::domain::token::models::TokenRecord;
use crate::domain::token::models::TokenScope;
use crate::domain::token::ports::TokenRepository;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

#[derive(sqlx::FromRow)]
struct TokenOwnerRow {
    hash: Vec<u8>,
    user_id: Uuid,
    scope: String,
    expiry: DateTime<Utc>,
    #[sqlx(flatten)]
    owner: UserRow,
}

impl TokenOwnerRow {
    fn into_record(self) -> Result<(TokenRecord, User), TokenError> {
        let record = TokenRecord {
            hash: TokenHash::from_slice(&self.hash)?,
            user_id: UserId(self.user_id),
            scope: self.scope.parse()?,
            expiry: self.expiry,
        };
        let owner = User::try_from(self.owner).map_err(|e| TokenError::Unknown(e.to_string()))?;
        Ok((record, owner))
    }
}

fn database_error(e: sqlx::Error) -> TokenError {
    TokenError::DatabaseError(e.to_string())
}

pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn insert(&self, record: &TokenRecord) -> Result<(), TokenError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.hash.as_bytes())
        .bind(record.user_id.0)
        .bind(record.expiry)
        .bind(record.scope.as_str())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn find_with_owner(
        &self,
        hash: &TokenHash,
        scope: TokenScope,
        now: DateTime<Utc>,
    ) -> Result<Option<(TokenRecord, User)>, TokenError> {
        let query = format!(
            r#"
            SELECT tokens.hash, tokens.user_id, tokens.scope, tokens.expiry, {USER_COLUMNS}
            FROM tokens
            INNER JOIN users ON users.id = tokens.user_id
            WHERE tokens.hash = $1 AND tokens.scope = $2 AND tokens.expiry > $3
            "#
        );
        let row: Option<TokenOwnerRow> = sqlx::query_as(&query)
            .bind(hash.as_bytes())
            .bind(scope.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(TokenOwnerRow::into_record).transpose()
    }

    async fn delete_by_hash(&self, hash: &TokenHash) -> Result<u64, TokenError> {
        let result = sqlx::query("DELETE FROM tokens WHERE hash = $1")
            .bind(hash.as_bytes())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_all_for_user(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<u64, TokenError> {
        let result = sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
            .bind(scope.as_str())
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_all_for_user_except(
        &self,
        scope: TokenScope,
        user_id: &UserId,
        keep: &TokenHash,
    ) -> Result<u64, TokenError> {
        let result = sqlx::query(
            "DELETE FROM tokens WHERE scope = $1 AND user_id = $2 AND hash <> $3",
        )
        .bind(scope.as_str())
        .bind(user_id.0)
        .bind(keep.as_bytes())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, TokenError> {
        let result = sqlx::query("DELETE FROM tokens WHERE expiry <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }
}
