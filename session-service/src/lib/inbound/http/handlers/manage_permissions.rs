use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn grant_permissions<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Path(role): Path<String>,
    Json(body): Json<PermissionsRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .grant_permissions(&Role::new(role), body.into_codes())
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Permissions granted"),
    ))
}

pub async fn revoke_permissions<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Path(role): Path<String>,
    Json(body): Json<PermissionsRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .revoke_permissions(&Role::new(role), body.into_codes())
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Permissions revoked"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionsRequest {
    #[serde(default)]
    permissions: Vec<String>,
}

impl PermissionsRequest {
    fn into_codes(self) -> Vec<PermissionCode> {
        self.permissions.into_iter().map(PermissionCode::new).collect()
    }
}
