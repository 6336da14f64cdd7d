use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use account_service::domain::auth::errors::AuthError;
use account_service::domain::auth::errors::EmailDeliveryError;
use account_service::domain::auth::models::AuthSettings;
use account_service::domain::auth::models::EmailMessage;
use account_service::domain::auth::models::Session;
use account_service::domain::auth::models::SessionId;
use account_service::domain::auth::models::Verification;
use account_service::domain::auth::models::VerificationPurpose;
use account_service::domain::auth::ports::CredentialRepository;
use account_service::domain::auth::ports::EmailSender;
use account_service::domain::auth::ports::SessionRepository;
use account_service::domain::auth::ports::VerificationRepository;
use account_service::domain::auth::service::AuthService;
use account_service::domain::user::errors::UserError;
use account_service::domain::user::models::EmailAddress;
use account_service::domain::user::models::UpdateProfileCommand;
use account_service::domain::user::models::User;
use account_service::domain::user::models::UserId;
use account_service::domain::user::ports::UserRepository;
use account_service::domain::user::service::UserService;
use account_service::inbound::http::router::create_router;
use account_service::inbound::http::router::RouterConfig;
use async_trait::async_trait;
use auth::JwtHandler;
use auth::SessionCookie;
use chrono::DateTime;
use chrono::Utc;
use serde_json::json;
use url::Url;

pub const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const APP_URL: &str = "http://localhost:3000";
pub const COOKIE_NAME: &str = "better-auth.session_token";
pub const PASSWORD: &str = "Password1!";

/// Test application that spawns a real server over in-memory storage
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub users: Arc<InMemoryUserRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub outbox: Arc<RecordingEmailSender>,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with adjusted auth settings
    pub async fn spawn_with(adjust: impl FnOnce(&mut AuthSettings)) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(InMemoryUserRepository::default());
        let sessions = Arc::new(InMemorySessionRepository::default());
        let credentials = Arc::new(InMemoryCredentialRepository::new(Arc::clone(&users)));
        let verifications = Arc::new(InMemoryVerificationRepository::default());
        let outbox = Arc::new(RecordingEmailSender::default());

        let mut settings = AuthSettings::with_defaults(format!("{}/api/auth", address));
        adjust(&mut settings);

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&sessions),
            credentials,
            verifications,
            Arc::clone(&outbox),
            JwtHandler::new(SECRET, address.clone()),
            settings,
        ));
        let user_service = Arc::new(UserService::new(Arc::clone(&users)));

        let router = create_router(
            user_service,
            auth_service,
            RouterConfig {
                public_url: address.clone(),
                app_url: Url::parse(APP_URL).unwrap(),
                session_cookie: SessionCookie::new("better-auth", false, 60 * 60 * 24 * 7),
                extra_origins: vec![],
                production: false,
            },
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address: address.clone(),
            api_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            users,
            sessions,
            outbox,
            jwt_handler: JwtHandler::new(SECRET, address),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(format!("{}{}", self.address, path))
    }

    /// Helper to make PATCH request
    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.patch(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.put(path).bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.patch(path).bearer_auth(token)
    }

    /// Register a user through the API and return its session token and id
    pub async fn sign_up(&self, name: &str, email: &str) -> (String, String) {
        let response = self
            .post("/api/auth/sign-up/email")
            .json(&json!({
                "name": name,
                "email": email,
                "password": PASSWORD
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        let token = body["token"].as_str().expect("No session token").to_string();
        let id = body["user"]["id"].as_str().expect("No user id").to_string();
        (token, id)
    }

    /// Register a user and grant it the admin flag
    pub async fn sign_up_admin(&self, name: &str, email: &str) -> (String, String) {
        let (token, id) = self.sign_up(name, email).await;
        let user_id = UserId::from_string(&id).unwrap();
        self.users
            .set_admin(&user_id, true, Utc::now())
            .await
            .unwrap()
            .expect("User disappeared");
        (token, id)
    }

    /// Raw token from the last email sent to `to`
    pub fn last_token_sent_to(&self, to: &str) -> String {
        let message = self
            .outbox
            .messages()
            .into_iter()
            .rev()
            .find(|message| message.to == to)
            .expect("No email sent");
        let url = message
            .text
            .split_whitespace()
            .last()
            .map(|url| Url::parse(url).expect("Email without link"))
            .unwrap();

        url.query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .or_else(|| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
            .expect("No token in link")
    }
}

/// Cookie-aware client that reports redirects instead of following them.
///
/// The shared `api_client` keeps no cookies so bearer tokens decide identity.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create reqwest client")
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Drop a user record behind the service's back
    pub fn remove(&self, id: &str) -> Option<User> {
        let user_id = UserId::from_string(id).ok()?;
        self.users.lock().unwrap().remove(&user_id)
    }

    /// Stored record, read without going through the API
    pub fn stored(&self, id: &str) -> Option<User> {
        let user_id = UserId::from_string(id).ok()?;
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    fn modify(&self, id: &UserId, change: impl FnOnce(&mut User)) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        users.get_mut(id).map(|user| {
            change(user);
            user.clone()
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        command: &UpdateProfileCommand,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        Ok(self.modify(id, |user| command.apply(user, updated_at)))
    }

    async fn set_admin(
        &self,
        id: &UserId,
        is_admin: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        Ok(self.modify(id, |user| {
            user.is_admin = is_admin;
            user.updated_at = updated_at;
        }))
    }

    async fn mark_email_verified(
        &self,
        id: &UserId,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserError> {
        Ok(self.modify(id, |user| {
            user.email_verified = true;
            user.updated_at = updated_at;
        }))
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<Vec<Session>>,
}

impl InMemorySessionRepository {
    pub fn count_for(&self, user_id: &str) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|session| session.user_id.to_string() == user_id)
            .count()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, AuthError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn find_by_token_hash(&self, token_hash: &[u8]) -> Result<Option<Session>, AuthError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|session| session.token_hash == token_hash)
            .cloned())
    }

    async fn delete_by_token_hash(&self, token_hash: &[u8]) -> Result<(), AuthError> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|session| session.token_hash != token_hash);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|session| &session.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_for_user_except(
        &self,
        user_id: &UserId,
        keep: &SessionId,
    ) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|session| &session.user_id != user_id || &session.id == keep);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|session| session.expires_at >= now);
        Ok((before - sessions.len()) as u64)
    }
}

pub struct InMemoryCredentialRepository {
    users: Arc<InMemoryUserRepository>,
    passwords: Mutex<HashMap<UserId, String>>,
}

impl InMemoryCredentialRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            users,
            passwords: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn create_user_with_password(
        &self,
        user: User,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let user = self.users.create(user).await?;
        self.passwords
            .lock()
            .unwrap()
            .insert(user.id, password_hash.to_string());
        Ok(user)
    }

    async fn upsert_password(
        &self,
        user_id: &UserId,
        password_hash: &str,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.passwords
            .lock()
            .unwrap()
            .insert(*user_id, password_hash.to_string());
        Ok(())
    }

    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, AuthError> {
        Ok(self.passwords.lock().unwrap().get(user_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryVerificationRepository {
    verifications: Mutex<Vec<Verification>>,
}

#[async_trait]
impl VerificationRepository for InMemoryVerificationRepository {
    async fn create(&self, verification: Verification) -> Result<Verification, AuthError> {
        self.verifications.lock().unwrap().push(verification.clone());
        Ok(verification)
    }

    async fn find(
        &self,
        token_hash: &[u8],
        purpose: VerificationPurpose,
    ) -> Result<Option<Verification>, AuthError> {
        Ok(self
            .verifications
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.token_hash == token_hash && v.purpose == purpose)
            .cloned())
    }

    async fn consume(
        &self,
        token_hash: &[u8],
        purpose: VerificationPurpose,
    ) -> Result<Option<Verification>, AuthError> {
        let mut verifications = self.verifications.lock().unwrap();
        let position = verifications
            .iter()
            .position(|v| v.token_hash == token_hash && v.purpose == purpose);
        Ok(position.map(|index| verifications.remove(index)))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut verifications = self.verifications.lock().unwrap();
        let before = verifications.len();
        verifications.retain(|v| v.expires_at >= now);
        Ok((before - verifications.len()) as u64)
    }
}

/// Keeps every message instead of delivering it
#[derive(Default)]
pub struct RecordingEmailSender {
    messages: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailDeliveryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
