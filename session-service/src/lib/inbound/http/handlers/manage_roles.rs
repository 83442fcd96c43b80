use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::access::models::Role;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::UserId;
use crate::domain::validation::ValidationErrors;
use crate::inbound::http::router::AppState;

pub async fn assign_roles<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    Json(body): Json<RolesRequest>,
) -> Result<ApiSuccess<RolesResponseData>, ApiError> {
    let user_id = parse_user_id(&user_id)?;

    state
        .auth_service
        .assign_roles(&user_id, body.into_roles())
        .await
        .map_err(ApiError::from)
        .map(|roles| ApiSuccess::new(StatusCode::OK, RolesResponseData { roles }))
}

pub async fn revoke_roles<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    Json(body): Json<RolesRequest>,
) -> Result<ApiSuccess<RolesResponseData>, ApiError> {
    let user_id = parse_user_id(&user_id)?;

    state
        .auth_service
        .revoke_roles(&user_id, body.into_roles())
        .await
        .map_err(ApiError::from)
        .map(|roles| ApiSuccess::new(StatusCode::OK, RolesResponseData { roles }))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::from_string(raw)
        .map_err(|e| ApiError::FailedValidation(ValidationErrors::single("user_id", e.to_string())))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RolesRequest {
    #[serde(default)]
    roles: Vec<String>,
}

impl RolesRequest {
    fn into_roles(self) -> Vec<Role> {
        self.roles.into_iter().map(Role::new).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolesResponseData {
    pub roles: Vec<Role>,
}
