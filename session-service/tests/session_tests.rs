mod common;

use std::sync::Arc;

use chrono::Duration;
use common::CacheMode;
use common::TestApp;
use common::PASSWORD;
use reqwest::StatusCode;
use serde_json::json;
use session_service::access::cache::AccessCache;
use session_service::access::models::PermissionCode;
use session_service::access::models::Role;
use session_service::auth::errors::AuthError;
use session_service::auth::models::LoginCommand;
use session_service::auth::models::LoginOutcome;
use session_service::auth::models::LogoutScope;
use session_service::auth::ports::AuthServicePort;
use session_service::token::models::TokenScope;
use session_service::user::models::RegisterUserCommand;
use session_service::user::models::UserId;

fn bearer(outcome: &LoginOutcome) -> String {
    format!("Bearer {}", outcome.authentication_token.plaintext)
}

async fn register(app: &TestApp, username: &str, email: &str) -> LoginOutcome {
    app.service
        .register_user(RegisterUserCommand {
            full_name: "Test User".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("registration succeeds")
}

async fn login(app: &TestApp, identifier: &str) -> LoginOutcome {
    app.service
        .login(LoginCommand {
            identifier: identifier.to_string(),
            password: PASSWORD.to_string(),
        })
        .await
        .expect("login succeeds")
}

#[tokio::test]
async fn test_authentication_token_expires_before_refresh_token() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;

    let session = app
        .service
        .authenticate(Some(&bearer(&outcome)))
        .await
        .expect("fresh token resolves");
    assert_eq!(session.user.id, outcome.user.id);

    app.clock.advance(Duration::hours(1) + Duration::seconds(1));

    let expired = app.service.authenticate(Some(&bearer(&outcome))).await;
    assert!(matches!(expired, Err(AuthError::InvalidToken)));

    let refreshed = app
        .service
        .refresh(Some(&outcome.refresh_token.plaintext))
        .await
        .expect("refresh token still live");
    assert!(app
        .service
        .authenticate(Some(&bearer(&refreshed)))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_refresh_token_expires_after_its_ttl() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;

    app.clock.advance(Duration::days(15) + Duration::seconds(1));

    let result = app
        .service
        .refresh(Some(&outcome.refresh_token.plaintext))
        .await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_wrong_scope_behaves_like_unknown() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;

    let as_bearer = format!("Bearer {}", outcome.refresh_token.plaintext);
    let result = app.service.authenticate(Some(&as_bearer)).await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));

    let result = app
        .service
        .refresh(Some(&outcome.authentication_token.plaintext))
        .await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_activation_token_expires() {
    let app = TestApp::spawn().await;
    register(&app, "ada.lovelace", "ada@example.com").await;
    app.drain_background().await;
    let token = app
        .mailer
        .last_token("ada@example.com", "user_welcome")
        .expect("welcome mail sent");

    app.clock.advance(Duration::hours(12) + Duration::seconds(1));

    let result = app.service.activate_user(&token).await;
    match result {
        Err(AuthError::Validation(errors)) => assert!(errors.get("token").is_some()),
        other => panic!("expected token validation error, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn test_password_reset_token_expires() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;
    app.drain_background().await;
    let activation = app
        .mailer
        .last_token("ada@example.com", "user_welcome")
        .expect("welcome mail sent");
    app.service
        .activate_user(&activation)
        .await
        .expect("activation succeeds");

    app.service
        .request_password_reset_token("ada@example.com")
        .await
        .expect("reset requested");
    app.drain_background().await;
    let token = app
        .mailer
        .last_token("ada@example.com", "password_reset_token")
        .expect("reset mail sent");

    app.clock.advance(Duration::minutes(45) + Duration::seconds(1));

    let result = app.service.reset_password(&token, "N3w-passphrase").await;
    assert!(matches!(result, Err(AuthError::Validation(_))));
    let stored = app.store.user(&outcome.user.id).expect("user stored");
    assert_eq!(stored.password.hash(), outcome.user.password.hash());
}

#[tokio::test]
async fn test_reaper_removes_only_expired_tokens() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;
    assert_eq!(app.store.total_tokens(), 3);

    app.clock.advance(Duration::hours(13));
    let removed = app.tokens.delete_expired().await.expect("reap succeeds");

    // Authentication (1h) and activation (12h) are gone; refresh (15d) stays.
    assert_eq!(removed, 2);
    assert_eq!(app.store.token_count(TokenScope::Refresh, &outcome.user.id), 1);
}

#[tokio::test]
async fn test_global_logout_invalidates_every_token() {
    let app = TestApp::spawn().await;
    let first = register(&app, "ada.lovelace", "ada@example.com").await;
    let second = login(&app, "ada.lovelace").await;

    let session = app
        .service
        .authenticate(Some(&bearer(&first)))
        .await
        .expect("session");
    app.service
        .logout(&session, LogoutScope::Global, None)
        .await
        .expect("logout succeeds");

    for outcome in [&first, &second] {
        let auth = app.service.authenticate(Some(&bearer(outcome))).await;
        assert!(matches!(auth, Err(AuthError::InvalidToken)));
        let refresh = app
            .service
            .refresh(Some(&outcome.refresh_token.plaintext))
            .await;
        assert!(matches!(refresh, Err(AuthError::InvalidCredentials)));
    }
}

#[tokio::test]
async fn test_others_logout_keeps_presented_tokens() {
    let app = TestApp::spawn().await;
    let current = register(&app, "ada.lovelace", "ada@example.com").await;
    let sibling = login(&app, "ada@example.com").await;

    let session = app
        .service
        .authenticate(Some(&bearer(&current)))
        .await
        .expect("session");
    app.service
        .logout(
            &session,
            LogoutScope::Others,
            Some(&current.refresh_token.plaintext),
        )
        .await
        .expect("logout succeeds");

    assert!(app
        .service
        .authenticate(Some(&bearer(&current)))
        .await
        .is_ok());
    assert!(matches!(
        app.service.authenticate(Some(&bearer(&sibling))).await,
        Err(AuthError::InvalidToken)
    ));
    assert!(app
        .service
        .refresh(Some(&current.refresh_token.plaintext))
        .await
        .is_ok());
    assert!(matches!(
        app.service
            .refresh(Some(&sibling.refresh_token.plaintext))
            .await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_concurrent_refresh_has_a_single_winner() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;
    let plaintext = Arc::new(outcome.refresh_token.plaintext.clone());

    let attempts = (0..4).map(|_| {
        let service = Arc::clone(&app.service);
        let plaintext = Arc::clone(&plaintext);
        tokio::spawn(async move { service.refresh(Some(plaintext.as_str())).await })
    });

    let mut winners = 0;
    for attempt in attempts.collect::<Vec<_>>() {
        match attempt.await.expect("task completes") {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, AuthError::InvalidCredentials)),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_logout_invalidates_cached_access() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;
    let cache = app.memory_cache.clone().expect("memory cache");

    let session = app
        .service
        .authenticate(Some(&bearer(&outcome)))
        .await
        .expect("session");
    assert!(cache.contains(&AccessCache::permissions_key(&outcome.user.id)));
    assert!(cache.contains(&AccessCache::roles_key(&outcome.user.id)));

    app.service
        .logout(&session, LogoutScope::Local, None)
        .await
        .expect("logout succeeds");

    assert!(!cache.contains(&AccessCache::permissions_key(&outcome.user.id)));
    assert!(!cache.contains(&AccessCache::roles_key(&outcome.user.id)));
}

#[tokio::test]
async fn test_permission_grant_reaches_cached_sessions() {
    let app = TestApp::spawn().await;
    let outcome = register(&app, "ada.lovelace", "ada@example.com").await;
    app.grant_role(&outcome.user.id, Role::new("moderator")).await;

    let before = app
        .service
        .authenticate(Some(&bearer(&outcome)))
        .await
        .expect("session");
    assert!(before.permissions.is_empty());

    app.service
        .grant_permissions(
            &Role::new("moderator"),
            vec![PermissionCode::new("users:view")],
        )
        .await
        .expect("grant succeeds");

    let after = app
        .service
        .authenticate(Some(&bearer(&outcome)))
        .await
        .expect("session");
    assert_eq!(after.permissions.codes().len(), 1);
}

/// Role assignment status and `/v1/me` access view under a cache mode.
async fn observed_access(mode: CacheMode) -> (StatusCode, serde_json::Value) {
    let app = TestApp::spawn_with(mode).await;
    let admin = app
        .register_activated_user("ada.lovelace", "ada@example.com")
        .await;
    app.grant_role(&admin.id, Role::new("admin")).await;

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = app
            .get_authenticated("/v1/me", &admin.authentication_token)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        bodies.push(json!([body["data"]["roles"], body["data"]["permissions"]]));
    }
    assert_eq!(bodies[0], bodies[1]);

    let target = app
        .register_activated_user("alan.turing", "alan@example.com")
        .await;
    let assign = app
        .put_authenticated(
            &format!("/v1/users/{}/roles", target.id),
            &admin.authentication_token,
        )
        .json(&json!({ "roles": ["user"] }))
        .send()
        .await
        .expect("Failed to execute request")
        .status();

    let anonymous = app
        .put(&format!("/v1/users/{}/roles", target.id))
        .json(&json!({ "roles": ["user"] }))
        .send()
        .await
        .expect("Failed to execute request")
        .status();
    assert_eq!(anonymous, StatusCode::FORBIDDEN);

    (assign, bodies.remove(0))
}

#[tokio::test]
async fn test_cache_outage_does_not_change_decisions() {
    let with_cache = observed_access(CacheMode::Memory).await;
    let without_cache = observed_access(CacheMode::Unavailable).await;

    assert_eq!(with_cache.0, StatusCode::OK);
    assert_eq!(with_cache, without_cache);
}

#[tokio::test]
async fn test_superadmin_manages_roles_before_activation() {
    let app = TestApp::spawn().await;
    let response = app.register("ada.lovelace", "ada@example.com").await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let token = body["data"]["authentication_token"]["token"]
        .as_str()
        .unwrap()
        .to_string();
    let id = UserId::from_string(body["data"]["user"]["id"].as_str().unwrap()).unwrap();
    app.grant_role(&id, Role::new("superadmin")).await;

    let response = app
        .put_authenticated(&format!("/v1/users/{}/roles", id), &token)
        .json(&json!({ "roles": ["user"] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get_authenticated("/v1/me", &token)
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["user"]["activated"], json!(false));
}
