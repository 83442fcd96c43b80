use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::create_activation_token::EmailRequest;
use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn create_password_reset_token<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<EmailRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .request_password_reset_token(&body.email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::ACCEPTED,
        MessageData::new("An email will be sent to you containing the password reset token"),
    ))
}
