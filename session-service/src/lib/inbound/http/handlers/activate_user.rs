use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn activate_user<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<ActivateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    state
        .auth_service
        .activate_user(&body.token)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivateUserRequest {
    #[serde(default)]
    token: String,
}
