use std::backtrace::Backtrace;

use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::SameSite;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::LoginOutcome;
use crate::domain::token::models::Token;
use crate::domain::user::models::User;
use crate::domain::validation::ValidationErrors;

pub mod activate_user;
pub mod create_activation_token;
pub mod create_authentication_token;
pub mod create_password_reset_token;
pub mod delete_authentication_token;
pub mod get_current_user;
pub mod healthcheck;
pub mod manage_permissions;
pub mod manage_roles;
pub mod refresh_authentication_token;
pub mod register_user;
pub mod reset_password;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Path the refresh cookie is scoped to.
pub const REFRESH_COOKIE_PATH: &str = "/v1/";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    FailedValidation(ValidationErrors),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    /// Bearer credential rejected; answered with `WWW-Authenticate: Bearer`.
    InvalidToken(String),
    Forbidden(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let challenge = matches!(self, ApiError::InvalidToken(_));
        let (status, message, field_errors) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            ApiError::FailedValidation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "The request contains invalid fields".to_string(),
                Some(errors),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unauthorized(msg) | ApiError::InvalidToken(msg) => {
                (StatusCode::UNAUTHORIZED, msg, None)
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
        };

        let mut response = (
            status,
            Json(ApiResponseBody::new_error(status, message, field_errors)),
        )
            .into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

const INVALID_TOKEN_MESSAGE: &str = "Invalid or missing authentication token";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound => {
                ApiError::NotFound("The requested resource could not be found".to_string())
            }
            AuthError::EditConflict => ApiError::Conflict(
                "Unable to update the record due to an edit conflict, please try again"
                    .to_string(),
            ),
            AuthError::Validation(errors) => ApiError::FailedValidation(errors),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid authentication credentials".to_string())
            }
            AuthError::InvalidToken => ApiError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string()),
            AuthError::AuthenticationRequired => ApiError::Unauthorized(
                "You must be authenticated to access this resource".to_string(),
            ),
            AuthError::InactiveAccount => ApiError::Forbidden(
                "Your user account must be activated to access this resource".to_string(),
            ),
            AuthError::NotPermitted => ApiError::Forbidden(
                "Your user account doesn't have the necessary permissions to access this resource"
                    .to_string(),
            ),
            AuthError::Password(_) | AuthError::DatabaseError(_) | AuthError::Unknown(_) => {
                tracing::error!(
                    error = %err,
                    backtrace = %Backtrace::force_capture(),
                    "Internal server error"
                );
                ApiError::InternalServerError(
                    "The server encountered a problem and could not process your request"
                        .to_string(),
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(
        status_code: StatusCode,
        message: String,
        field_errors: Option<ValidationErrors>,
    ) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData {
                message,
                field_errors,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<ValidationErrors>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub activated: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            full_name: user.full_name.clone(),
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            activated: user.activated,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenData {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl From<&Token> for TokenData {
    fn from(token: &Token) -> Self {
        Self {
            token: token.plaintext.clone(),
            expiry: token.expiry(),
        }
    }
}

/// Body returned when a session starts: the bearer token and its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub authentication_token: TokenData,
    pub user: UserData,
}

impl From<&LoginOutcome> for SessionResponseData {
    fn from(outcome: &LoginOutcome) -> Self {
        Self {
            authentication_token: (&outcome.authentication_token).into(),
            user: (&outcome.user).into(),
        }
    }
}

/// HTTP-only, secure, strict-same-site cookie carrying a refresh token.
pub fn refresh_cookie(token: &Token) -> Cookie<'static> {
    let expires = time::OffsetDateTime::from_unix_timestamp(token.expiry().timestamp()).ok();

    Cookie::build((REFRESH_COOKIE, token.plaintext.clone()))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .expires(expires)
        .build()
}
