use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

pub(super) const USER_COLUMNS: &str = "users.id, users.full_name, users.username, users.email, \
     users.password_hash, users.activated, users.version, users.last_login_at, users.created_at";

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    id: Uuid,
    full_name: String,
    username: String,
    email: String,
    password_hash: String,
    activated: bool,
    version: i32,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            full_name: row.full_name,
            username: Username::new(row.username)?,
            email: EmailAddress::new(row.email)?,
            password: Password::from_hash(row.password_hash),
            activated: row.activated,
            version: row.version,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

fn map_write_error(e: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("users_username_key") {
                return UserError::UsernameAlreadyExists(user.username.as_str().to_string());
            }
            if db_err.constraint() == Some("users_email_key") {
                return UserError::EmailAlreadyExists(user.email.as_str().to_string());
            }
        }
    }
    UserError::DatabaseError(e.to_string())
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, UserError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let password_hash = user
            .password
            .hash()
            .ok_or_else(|| UserError::Unknown(format!("missing password hash for {}", user.id)))?;

        let (version, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO users (id, full_name, username, email, password_hash, activated, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING version, created_at
            "#,
        )
        .bind(user.id.0)
        .bind(&user.full_name)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(password_hash)
        .bind(user.activated)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        Ok(User {
            version,
            created_at,
            ..user
        })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        self.find_one("email", email.as_str()).await
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        self.find_one("username", username.as_str()).await
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let password_hash = user
            .password
            .hash()
            .ok_or_else(|| UserError::Unknown(format!("missing password hash for {}", user.id)))?;

        let version: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET full_name = $3, username = $4, email = $5, password_hash = $6,
                activated = $7, last_login_at = $8, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(user.id.0)
        .bind(user.version)
        .bind(&user.full_name)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(password_hash)
        .bind(user.activated)
        .bind(user.last_login_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        match version {
            Some(version) => Ok(User { version, ..user }),
            None => Err(UserError::EditConflict(user.id.to_string())),
        }
    }
}
