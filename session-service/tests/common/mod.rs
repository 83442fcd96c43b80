#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use reqwest::header::COOKIE;
use reqwest::header::SET_COOKIE;
use session_service::domain::access::cache::AccessCache;
use session_service::domain::access::errors::AccessError;
use session_service::domain::access::models::PermissionCode;
use session_service::domain::access::models::Role;
use session_service::domain::access::ports::AccessRepository;
use session_service::domain::access::service::AccessService;
use session_service::domain::auth::models::TokenTtls;
use session_service::domain::auth::service::AuthService;
use session_service::domain::cache::Cache;
use session_service::domain::clock::Clock;
use session_service::domain::errors::CacheError;
use session_service::domain::errors::MailerError;
use session_service::domain::mail::models::Mail;
use session_service::domain::mail::ports::Mailer;
use session_service::domain::token::errors::TokenError;
use session_service::domain::token::models::TokenHash;
use session_service::domain::token::models::TokenRecord;
use session_service::domain::token::models::TokenScope;
use session_service::domain::token::ports::TokenRepository;
use session_service::domain::token::store::TokenStore;
use session_service::domain::user::errors::UserError;
use session_service::domain::user::models::EmailAddress;
use session_service::domain::user::models::Password;
use session_service::domain::user::models::User;
use session_service::domain::user::models::UserId;
use session_service::domain::user::models::Username;
use session_service::domain::user::ports::UserRepository;
use session_service::inbound::http::router::create_router;
use tokio_util::task::TaskTracker;

pub type TestAuthService = AuthService<InMemoryStore, InMemoryStore, InMemoryStore>;

pub const PASSWORD: &str = "Pa55word!";

/// Users, tokens, roles and permissions held in memory.
///
/// Seeded with the same roles, permission codes and admin mapping as the
/// migrations.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    tokens: HashMap<TokenHash, TokenRecord>,
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
    role_permissions: BTreeMap<String, BTreeSet<String>>,
    user_roles: HashMap<UserId, BTreeSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let mut state = StoreState::default();
        for role in ["superadmin", "admin", "moderator", "user"] {
            state.roles.insert(role.to_string());
        }
        let codes = [
            "debugvars:view",
            "admins:view",
            "admins:manage",
            "users:view",
            "users:manage",
            "roles:view",
            "roles:manage",
        ];
        for code in codes {
            state.permissions.insert(code.to_string());
        }
        state.role_permissions.insert(
            "admin".to_string(),
            codes[1..].iter().map(|c| c.to_string()).collect(),
        );

        Self {
            state: Mutex::new(state),
        }
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.state.lock().unwrap().users.get(id).cloned()
    }

    pub fn token_count(&self, scope: TokenScope, user_id: &UserId) -> usize {
        self.state
            .lock()
            .unwrap()
            .tokens
            .values()
            .filter(|t| t.scope == scope && t.user_id == *user_id)
            .count()
    }

    pub fn total_tokens(&self) -> usize {
        self.state.lock().unwrap().tokens.len()
    }
}

fn persisted(user: &User) -> User {
    let hash = user
        .password
        .hash()
        .expect("persisted users carry a hash")
        .to_string();
    User {
        password: Password::from_hash(hash),
        ..user.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut state = self.state.lock().unwrap();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(UserError::UsernameAlreadyExists(user.username.to_string()));
        }
        let stored = persisted(&user);
        state.users.insert(user.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.state.lock().unwrap().users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| &u.username == username).cloned())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut state = self.state.lock().unwrap();
        match state.users.get(&user.id) {
            Some(current) if current.version == user.version => {}
            _ => return Err(UserError::EditConflict(user.id.to_string())),
        }
        let mut stored = persisted(&user);
        stored.version += 1;
        state.users.insert(user.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl TokenRepository for InMemoryStore {
    async fn insert(&self, record: &TokenRecord) -> Result<(), TokenError> {
        let mut state = self.state.lock().unwrap();
        state.tokens.insert(record.hash, record.clone());
        Ok(())
    }

    async fn find_with_owner(
        &self,
        hash: &TokenHash,
        scope: TokenScope,
        now: DateTime<Utc>,
    ) -> Result<Option<(TokenRecord, User)>, TokenError> {
        let state = self.state.lock().unwrap();
        let found = state
            .tokens
            .get(hash)
            .filter(|record| record.scope == scope && record.expiry > now)
            .and_then(|record| {
                state
                    .users
                    .get(&record.user_id)
                    .map(|user| (record.clone(), user.clone()))
            });
        Ok(found)
    }

    async fn delete_by_hash(&self, hash: &TokenHash) -> Result<u64, TokenError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.tokens.remove(hash).map_or(0, |_| 1))
    }

    async fn delete_all_for_user(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<u64, TokenError> {
        let mut state = self.state.lock().unwrap();
        let before = state.tokens.len();
        state
            .tokens
            .retain(|_, t| !(t.scope == scope && t.user_id == *user_id));
        Ok((before - state.tokens.len()) as u64)
    }

    async fn delete_all_for_user_except(
        &self,
        scope: TokenScope,
        user_id: &UserId,
        keep: &TokenHash,
    ) -> Result<u64, TokenError> {
        let mut state = self.state.lock().unwrap();
        let before = state.tokens.len();
        state
            .tokens
            .retain(|hash, t| !(t.scope == scope && t.user_id == *user_id && hash != keep));
        Ok((before - state.tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, TokenError> {
        let mut state = self.state.lock().unwrap();
        let before = state.tokens.len();
        state.tokens.retain(|_, t| t.expiry > now);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl AccessRepository for InMemoryStore {
    async fn roles_for_user(&self, user_id: &UserId) -> Result<Vec<Role>, AccessError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .user_roles
            .get(user_id)
            .map(|roles| roles.iter().cloned().map(Role::new).collect())
            .unwrap_or_default())
    }

    async fn permissions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PermissionCode>, AccessError> {
        let state = self.state.lock().unwrap();
        let codes: BTreeSet<String> = state
            .user_roles
            .get(user_id)
            .into_iter()
            .flatten()
            .filter_map(|role| state.role_permissions.get(role))
            .flatten()
            .cloned()
            .collect();
        Ok(codes.into_iter().map(PermissionCode::new).collect())
    }

    async fn add_roles_for_user(&self, user_id: &UserId, roles: &[Role]) -> Result<(), AccessError> {
        let mut state = self.state.lock().unwrap();
        for role in roles {
            if !state.roles.contains(role.as_str()) {
                return Err(AccessError::RoleNotFound(role.to_string()));
            }
        }
        let held = state.user_roles.entry(*user_id).or_default();
        if let Some(role) = roles.iter().find(|r| held.contains(r.as_str())) {
            return Err(AccessError::RoleAlreadyAssigned(role.to_string()));
        }
        held.extend(roles.iter().map(|r| r.as_str().to_string()));
        Ok(())
    }

    async fn remove_roles_for_user(
        &self,
        user_id: &UserId,
        roles: &[Role],
    ) -> Result<(), AccessError> {
        let mut state = self.state.lock().unwrap();
        let held = state.user_roles.entry(*user_id).or_default();
        let removed = roles.iter().filter(|r| held.remove(r.as_str())).count();
        if removed == 0 {
            return Err(AccessError::RoleNotFound(
                roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", "),
            ));
        }
        Ok(())
    }

    async fn add_permissions_for_role(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError> {
        let mut state = self.state.lock().unwrap();
        if !state.roles.contains(role.as_str()) {
            return Err(AccessError::RoleNotFound(role.to_string()));
        }
        for code in codes {
            if !state.permissions.contains(code.as_str()) {
                return Err(AccessError::PermissionNotFound(code.to_string()));
            }
        }
        let granted = state
            .role_permissions
            .entry(role.as_str().to_string())
            .or_default();
        if let Some(code) = codes.iter().find(|c| granted.contains(c.as_str())) {
            return Err(AccessError::PermissionAlreadyGranted(code.to_string()));
        }
        granted.extend(codes.iter().map(|c| c.as_str().to_string()));
        Ok(())
    }

    async fn remove_permissions_for_role(
        &self,
        role: &Role,
        codes: &[PermissionCode],
    ) -> Result<(), AccessError> {
        let mut state = self.state.lock().unwrap();
        let granted = state
            .role_permissions
            .entry(role.as_str().to_string())
            .or_default();
        let removed = codes.iter().filter(|c| granted.remove(c.as_str())).count();
        if removed == 0 {
            return Err(AccessError::PermissionNotFound(
                codes
                    .iter()
                    .map(PermissionCode::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }
        Ok(())
    }
}

/// Process-local cache honouring TTLs and `prefix*` patterns.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<(), CacheError> {
        let prefix = pattern.trim_end_matches('*');
        self.entries
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// Cache whose backend is down: every operation fails.
pub struct UnavailableCache;

#[async_trait]
impl Cache for UnavailableCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn invalidate(&self, _pattern: &str) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

/// Mailer that keeps every mail it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, Mail)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, Mail)> {
        self.sent.lock().unwrap().clone()
    }

    /// Token carried by the latest mail of `template` sent to `recipient`.
    pub fn last_token(&self, recipient: &str, template: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|(to, mail)| to == recipient && mail.template_name() == template)
            .find_map(|(_, mail)| match mail {
                Mail::UserWelcome {
                    activation_token, ..
                }
                | Mail::ActivationToken {
                    activation_token, ..
                } => Some(activation_token.clone()),
                Mail::PasswordResetToken {
                    password_reset_token,
                } => Some(password_reset_token.clone()),
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipient: &str, mail: &Mail) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), mail.clone()));
        Ok(())
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Which cache backs the role/permission layer.
pub enum CacheMode {
    Memory,
    Unavailable,
}

/// Account created through the API and activated.
pub struct RegisteredUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub authentication_token: String,
    pub refresh_token: String,
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub store: Arc<InMemoryStore>,
    pub memory_cache: Option<Arc<InMemoryCache>>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<ManualClock>,
    pub tokens: Arc<TokenStore<InMemoryStore>>,
    pub service: Arc<TestAuthService>,
    pub background: TaskTracker,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(CacheMode::Memory).await
    }

    pub async fn spawn_with(mode: CacheMode) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new());
        let mailer = Arc::new(RecordingMailer::default());

        let memory_cache = match mode {
            CacheMode::Memory => Some(Arc::new(InMemoryCache::default())),
            CacheMode::Unavailable => None,
        };
        let cache: Arc<dyn Cache> = match &memory_cache {
            Some(cache) => cache.clone(),
            None => Arc::new(UnavailableCache),
        };

        let tokens = Arc::new(TokenStore::new(Arc::clone(&store), clock.clone()));
        let access = Arc::new(AccessService::new(
            Arc::clone(&store),
            AccessCache::new(cache, AccessCache::DEFAULT_TTL),
        ));
        let background = TaskTracker::new();
        let service = Arc::new(AuthService::new(
            Arc::clone(&store),
            Arc::clone(&tokens),
            access,
            mailer.clone(),
            TokenTtls::default(),
            background.clone(),
        ));

        let router = create_router(
            Arc::clone(&service),
            "testing".to_string(),
            Duration::from_secs(10),
        );

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            store,
            memory_cache,
            mailer,
            clock,
            tokens,
            service,
            background,
        }
    }

    /// Wait for mail tasks spawned so far.
    pub async fn drain_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(&format!("{}{}", self.address, path))
    }

    /// Helper to make DELETE request
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.put(path).bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.delete(path).bearer_auth(token)
    }

    /// Present a refresh token the way a browser returns the cookie.
    pub fn with_refresh_cookie(
        builder: reqwest::RequestBuilder,
        refresh_token: &str,
    ) -> reqwest::RequestBuilder {
        builder.header(COOKIE, format!("refresh_token={}", refresh_token))
    }

    pub async fn register(&self, username: &str, email: &str) -> reqwest::Response {
        self.post("/v1/users")
            .json(&serde_json::json!({
                "full_name": "Test User",
                "username": username,
                "email": email,
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username_or_email: &str, password: &str) -> reqwest::Response {
        self.post("/v1/tokens/authentication")
            .json(&serde_json::json!({
                "username_or_email": username_or_email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register, activate through the mailed token, and return credentials.
    pub async fn register_activated_user(&self, username: &str, email: &str) -> RegisteredUser {
        let response = self.register(username, email).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let refresh_token = refresh_cookie(&response).expect("refresh cookie set");
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");

        self.drain_background().await;
        let activation_token = self
            .mailer
            .last_token(email, "user_welcome")
            .expect("welcome mail sent");
        let response = self
            .put("/v1/users/activate")
            .json(&serde_json::json!({ "token": activation_token }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        RegisteredUser {
            id: UserId::from_string(body["data"]["user"]["id"].as_str().unwrap()).unwrap(),
            username: username.to_string(),
            email: email.to_string(),
            authentication_token: body["data"]["authentication_token"]["token"]
                .as_str()
                .unwrap()
                .to_string(),
            refresh_token,
        }
    }

    pub async fn grant_role(&self, user_id: &UserId, role: Role) {
        AccessRepository::add_roles_for_user(self.store.as_ref(), user_id, &[role])
            .await
            .expect("role assigned");
    }
}

/// Value of the `refresh_token` cookie set by a response.
pub fn refresh_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let pair = value.split(';').next()?;
            let token = pair.strip_prefix("refresh_token=")?;
            (!token.is_empty()).then(|| token.to_string())
        })
}

/// Full `Set-Cookie` line for the refresh token.
pub fn refresh_cookie_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("refresh_token="))
        .map(str::to_string)
}
