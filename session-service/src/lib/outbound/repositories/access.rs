use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::access::errors::AccessError;
use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::access::ports::AccessRepository;
use crate::domain::user::models::UserId;

fn database_error(e: sqlx::Error) -> AccessError {
    AccessError::DatabaseError(e.to_string())
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessRepository for PostgresAccessRepository {
    async fn roles_for_user(&self, user_id: &UserId) -> Result<Vec<Role>, AccessError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT roles.name
            FROM roles
            INNER JOIN user_roles ON user_roles.role_id = roles.id
            WHERE user_roles.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(names.into_iter().map(Role::new).collect())
    }

    async fn permissions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PermissionCode>, AccessError> {
        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT permissions.code
            FROM permissions
            INNER JOIN roles_permissions ON roles_permissions.permission_id = permissions.id
            INNER JOIN user_roles ON user_roles.role_id = roles_permissions.role_id
            WHERE user_roles.user_id = $1
            ORDER BY permissions.code
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(codes.into_iter().map(PermissionCode::new).collect())
    }

    async fn add_roles_for_user(&self, user_id: &UserId, roles: &[Role]) -> Result<(), AccessError> {
        let names = distinct(roles.iter().map(Role::as_str));
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, roles.id FROM roles WHERE roles.name = ANY($2)
            "#,
        )
        .bind(user_id.0)
        .bind(&names)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some("user_roles_pkey") {
                    return AccessError::RoleAlreadyAssigned(names.join(", "));
                }
            }
            database_error(e)
        })?;

        // Unknown names match no row; dropping the transaction rolls back.
        if result.rows_affected() < names.len() as u64 {
            return Err(AccessError::RoleNotFound(names.join(", ")));
        }

        tx.commit().await.map_err(database_error)
    }

    async fn remove_roles_for_user(
        &self,
        user_id: &UserId,
        roles: &[Role],
    ) -> Result<(), AccessError> {
        let names = distinct(roles.iter().map(Role::as_str));

        let result = sqlx::query(
            r#"
            DELETE FROM user_roles
            USING roles
            WHERE user_roles.role_id = roles.id
              AND user_roles.user_id = $1
              AND roles.name = ANY($2)
            "#,
        )
        .bind(user_id.0)
        .bind(&names)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AccessError::RoleNotFound(names.join(", ")));
        }
        Ok(())
    }

    async fn add_permissions_for_role(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError> {
        let codes = distinct(codes.iter().map(PermissionCode::as_str));
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let role_id: Option<i64> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(role.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(database_error)?;
        let role_id = role_id.ok_or_else(|| AccessError::RoleNotFound(role.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO roles_permissions (role_id, permission_id)
            SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
            "#,
        )
        .bind(role_id)
        .bind(&codes)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("roles_permissions_pkey")
                {
                    return AccessError::PermissionAlreadyGranted(codes.join(", "));
                }
            }
            database_error(e)
        })?;

        if result.rows_affected() < codes.len() as u64 {
            return Err(AccessError::PermissionNotFound(codes.join(", ")));
        }

        tx.commit().await.map_err(database_error)
    }

    async fn remove_permissions_for_role(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError> {
        let codes = distinct(codes.iter().map(PermissionCode::as_str));

        let result = sqlx::query(
            r#"
            DELETE FROM roles_permissions
            USING roles, permissions
            WHERE roles_permissions.role_id = roles.id
              AND roles_permissions.permission_id = permissions.id
              AND roles.name = $1
              AND permissions.code = ANY($2)
            "#,
        )
        .bind(role.as_str())
        .bind(&codes)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(AccessError::PermissionNotFound(codes.join(", ")));
        }
        Ok(())
    }
}
