use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use super::REFRESH_COOKIE;
use super::REFRESH_COOKIE_PATH;
use crate::domain::auth::models::LogoutScope;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::middleware::CurrentSession;
use crate::inbound::http::router::AppState;

/// Log out with `?scope=local|global|others`.
pub async fn delete_authentication_token<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    CurrentSession(session): CurrentSession,
    jar: CookieJar,
    Query(params): Query<LogoutParams>,
) -> Result<(CookieJar, ApiSuccess<MessageData>), ApiError> {
    let scope: LogoutScope = params
        .scope
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(ApiError::FailedValidation)?;
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    state
        .auth_service
        .logout(&session, scope, presented.as_deref())
        .await
        .map_err(ApiError::from)?;

    // The cookie stays valid for `others`.
    let jar = match scope {
        LogoutScope::Others => jar,
        LogoutScope::Local | LogoutScope::Global => {
            jar.remove(Cookie::build(REFRESH_COOKIE).path(REFRESH_COOKIE_PATH))
        }
    };

    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, MessageData::new("You have been logged out")),
    ))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutParams {
    scope: Option<String>,
}
