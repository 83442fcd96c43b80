use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::refresh_cookie;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Log in with a username or email and a password.
///
/// The refresh token is set as a cookie; the authentication token is in
/// the body.
pub async fn create_authentication_token<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    Json(body): Json<CreateAuthenticationTokenRequest>,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let outcome = state
        .auth_service
        .login(LoginCommand {
            identifier: body.username_or_email,
            password: body.password,
        })
        .await
        .map_err(ApiError::from)?;

    Ok((
        jar.add(refresh_cookie(&outcome.refresh_token)),
        ApiSuccess::new(StatusCode::CREATED, (&outcome).into()),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAuthenticationTokenRequest {
    #[serde(default)]
    username_or_email: String,
    #[serde(default)]
    password: String,
}
