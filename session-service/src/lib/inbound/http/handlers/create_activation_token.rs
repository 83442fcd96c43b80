use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn create_activation_token<S: AuthServicePort>(
    State(state): State<AppState<S>>,
    Json(body): Json<EmailRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .request_activation_token(&body.email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::ACCEPTED,
        MessageData::new("An email will be sent to you containing the activation token"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}
