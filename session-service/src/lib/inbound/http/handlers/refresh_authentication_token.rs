use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;

use super::refresh_cookie;
use super::ApiError;
use super::ApiSuccess;
use super::SessionResponseData;
use super::REFRESH_COOKIE;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

/// Rotate the refresh token from the cookie and issue a new bearer token.
pub async fn refresh_authentication_token<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<SessionResponseData>), ApiError> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    let outcome = state
        .auth_service
        .refresh(presented.as_deref())
        .await
        .map_err(ApiError::from)?;

    Ok((
        jar.add(refresh_cookie(&outcome.refresh_token)),
        ApiSuccess::new(StatusCode::CREATED, (&outcome).into()),
    ))
}
