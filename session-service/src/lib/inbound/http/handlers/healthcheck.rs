use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn healthcheck<S: AuthServicePort>(
    State(state): State<AppState<S>>,
) -> ApiSuccess<HealthcheckResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        HealthcheckResponseData {
            status: "available".to_string(),
            environment: state.environment.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthcheckResponseData {
    pub status: String,
    pub environment: String,
    pub version: String,
}
