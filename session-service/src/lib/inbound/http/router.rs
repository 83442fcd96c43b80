use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::activate_user::activate_user;
use super::handlers::create_activation_token::create_activation_token;
use super::handlers::create_authentication_token::create_authentication_token;
use super::handlers::create_password_reset_token::create_password_reset_token;
use super::handlers::delete_authentication_token::delete_authentication_token;
use super::handlers::get_current_user::get_current_user;
use super::handlers::healthcheck::healthcheck;
use super::handlers::manage_permissions::grant_permissions;
use super::handlers::manage_permissions::revoke_permissions;
use super::handlers::manage_roles::assign_roles;
use super::handlers::manage_roles::revoke_roles;
use super::handlers::refresh_authentication_token::refresh_authentication_token;
use super::handlers::register_user::register_user;
use super::handlers::reset_password::reset_password;
use super::middleware::authenticate;
use super::middleware::require_authenticated;
use super::middleware::require_permissions;
use super::middleware::RequiredPermissions;
use crate::domain::access::models::PermissionCode;
use crate::domain::auth::ports::AuthServicePort;

pub struct AppState<S: AuthServicePort> {
    pub auth_service: Arc<S>,
    pub environment: String,
}

impl<S: AuthServicePort> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
            environment: self.environment.clone(),
        }
    }
}

pub fn create_router<S: AuthServicePort>(
    auth_service: Arc<S>,
    environment: String,
    request_timeout: Duration,
) -> Router {
    let state = AppState {
        auth_service,
        environment,
    };

    let public_routes = Router::new()
        .route("/v1/healthcheck", get(healthcheck::<S>))
        .route("/v1/users", post(register_user::<S>))
        .route("/v1/users/activate", put(activate_user::<S>))
        .route("/v1/users/password", put(reset_password::<S>))
        .route(
            "/v1/tokens/authentication",
            post(create_authentication_token::<S>),
        )
        .route("/v1/tokens/refresh", post(refresh_authentication_token::<S>))
        .route("/v1/tokens/activation", post(create_activation_token::<S>))
        .route(
            "/v1/tokens/password-reset",
            post(create_password_reset_token::<S>),
        );

    let authenticated_routes = Router::new()
        .route("/v1/me", get(get_current_user))
        .route(
            "/v1/tokens/authentication",
            delete(delete_authentication_token::<S>),
        )
        .route_layer(middleware::from_fn(require_authenticated));

    let role_admin_routes = Router::new()
        .route(
            "/v1/users/:user_id/roles",
            put(assign_roles::<S>).delete(revoke_roles::<S>),
        )
        .route(
            "/v1/roles/:role/permissions",
            put(grant_permissions::<S>).delete(revoke_permissions::<S>),
        )
        .route_layer(middleware::from_fn_with_state(
            RequiredPermissions::new([PermissionCode::ROLES_MANAGE]),
            require_permissions,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(role_admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<S>,
        ))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
