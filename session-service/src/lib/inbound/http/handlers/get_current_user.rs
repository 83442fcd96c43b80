use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;
use super::UserData;
use crate::domain::access::models::PermissionCode;
use crate::domain::access::models::Role;
use crate::inbound::http::middleware::CurrentSession;

pub async fn get_current_user(
    CurrentSession(session): CurrentSession,
) -> ApiSuccess<CurrentUserResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        CurrentUserResponseData {
            user: session.user.as_ref().into(),
            roles: session.roles.clone(),
            permissions: session.permissions.codes(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUserResponseData {
    pub user: UserData,
    pub roles: Vec<Role>,
    pub permissions: Vec<PermissionCode>,
}
