use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::access::models::PermissionCode;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::session::models::Session;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

const AUTHENTICATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Request's authorization context, attached by [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    /// # Panics
    /// If the route is not behind the [`authenticate`] middleware.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(CurrentSession(session.clone())),
            None => panic!("missing session in request extensions"),
        }
    }
}

/// Permission codes a route group demands.
#[derive(Debug, Clone)]
pub struct RequiredPermissions(Arc<[PermissionCode]>);

impl RequiredPermissions {
    pub fn new(codes: impl IntoIterator<Item = PermissionCode>) -> Self {
        Self(codes.into_iter().collect())
    }
}

fn vary_on_authorization(mut response: Response) -> Response {
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

/// Middleware that turns the `Authorization` header into a [`Session`].
///
/// Requests without the header continue as anonymous; a present but
/// unusable credential is rejected with 401.
pub async fn authenticate<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value.to_string()),
            Err(_) => {
                return vary_on_authorization(ApiError::from(AuthError::InvalidToken).into_response())
            }
        },
    };

    let session = match tokio::time::timeout(
        AUTHENTICATE_TIMEOUT,
        state.auth_service.authenticate(authorization.as_deref()),
    )
    .await
    {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Authentication rejected");
            return vary_on_authorization(ApiError::from(e).into_response());
        }
        Err(_) => {
            let e = AuthError::Unknown(format!(
                "authentication timed out after {:?}",
                AUTHENTICATE_TIMEOUT
            ));
            return vary_on_authorization(ApiError::from(e).into_response());
        }
    };

    req.extensions_mut().insert(session);

    vary_on_authorization(next.run(req).await)
}

/// Reject anonymous sessions.
pub async fn require_authenticated(
    CurrentSession(session): CurrentSession,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    session.require_authenticated()?;
    Ok(next.run(req).await)
}

/// Reject sessions missing any of the required permissions.
pub async fn require_permissions(
    State(required): State<RequiredPermissions>,
    CurrentSession(session): CurrentSession,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    session.require_permissions(&required.0)?;
    Ok(next.run(req).await)
}
