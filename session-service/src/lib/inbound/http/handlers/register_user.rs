use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::refresh_cookie;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::RegisterUserCommand;
use crate::inbound::http::router::AppState;

/// Register an account and start its first session.
pub async fn register_user<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let outcome = state
        .auth_service
        .register_user(body.into_command())
        .await
        .map_err(ApiError::from)?;

    Ok((
        jar.add(refresh_cookie(&outcome.refresh_token)),
        ApiSuccess::new(StatusCode::CREATED, (&outcome).into()),
    ))
}

/// HTTP request body for registering a user (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl RegisterUserRequest {
    fn into_command(self) -> RegisterUserCommand {
        RegisterUserCommand {
            full_name: self.full_name,
            username: self.username,
            email: self.email,
            password: self.password,
        }
    }
}
