use std::sync::Arc;

use async_trait::async_trait;
use auth::token;
use auth::JwtHandler;
use auth::PasswordHasher;
use auth::SessionClaims;
use chrono::Duration;
use chrono::Utc;
use url::Url;
use uuid::Uuid;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::AuthSettings;
use crate::domain::auth::models::ClientInfo;
use crate::domain::auth::models::EmailMessage;
use crate::domain::auth::models::IssuedSession;
use crate::domain::auth::models::Session;
use crate::domain::auth::models::SessionId;
use crate::domain::auth::models::SignUpCommand;
use crate::domain::auth::models::SignUpOutcome;
use crate::domain::auth::models::Verification;
use crate::domain::auth::models::VerificationPurpose;
use crate::domain::auth::ports::AuthProvider;
use crate::domain::auth::ports::CredentialRepository;
use crate::domain::auth::ports::EmailSender;
use crate::domain::auth::ports::SessionRepository;
use crate::domain::auth::ports::VerificationRepository;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserRepository;

/// Built-in credential provider.
///
/// Passwords are Argon2id hashes in the credential store, sessions and
/// one-time links are opaque tokens stored by digest, and JWTs are HS256.
pub struct AuthService<UR, SR, CR, VR, ES>
where
    UR: UserRepository,
    SR: SessionRepository,
    CR: CredentialRepository,
    VR: VerificationRepository,
    ES: EmailSender,
{
    users: Arc<UR>,
    sessions: Arc<SR>,
    credentials: Arc<CR>,
    verifications: Arc<VR>,
    email_sender: Arc<ES>,
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    settings: AuthSettings,
}

impl<UR, SR, CR, VR, ES> AuthService<UR, SR, CR, VR, ES>
where
    UR: UserRepository,
    SR: SessionRepository,
    CR: CredentialRepository,
    VR: VerificationRepository,
    ES: EmailSender,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<UR>,
        sessions: Arc<SR>,
        credentials: Arc<CR>,
        verifications: Arc<VR>,
        email_sender: Arc<ES>,
        jwt_handler: JwtHandler,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            sessions,
            credentials,
            verifications,
            email_sender,
            password_hasher: PasswordHasher::new(),
            jwt_handler,
            settings,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    fn hash_new_password(&self, password: &str) -> Result<String, AuthError> {
        self.settings.password_policy.check(password)?;
        Ok(self.password_hasher.hash(password)?)
    }

    /// Absolute link under the auth base URL.
    fn link(&self, path: &str, query: &[(&str, &str)]) -> Result<String, AuthError> {
        let base = self.settings.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| AuthError::Unknown(format!("Invalid auth base url: {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    async fn create_verification(
        &self,
        email: &EmailAddress,
        purpose: VerificationPurpose,
        lifetime: Duration,
    ) -> Result<String, AuthError> {
        let raw_token = token::generate()?;
        let now = Utc::now();

        self.verifications
            .create(Verification {
                id: Uuid::new_v4(),
                identifier: email.to_string(),
                purpose,
                token_hash: token::digest(&raw_token),
                expires_at: now + lifetime,
                created_at: now,
            })
            .await?;

        Ok(raw_token)
    }

    async fn consume_verification(
        &self,
        raw_token: &str,
        purpose: VerificationPurpose,
    ) -> Result<Verification, AuthError> {
        let verification = self
            .verifications
            .consume(&token::digest(raw_token), purpose)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if verification.is_expired(Utc::now()) {
            tracing::debug!(purpose = purpose.as_str(), "Expired verification token used");
            return Err(AuthError::InvalidToken);
        }
        Ok(verification)
    }

    /// Delivery problems never fail the flow that triggered the email.
    async fn deliver(&self, message: EmailMessage) {
        if let Err(e) = self.email_sender.send(&message).await {
            tracing::error!(
                error = %e,
                to = %message.to,
                subject = %message.subject,
                "Failed to send email"
            );
        }
    }

    /// Delete sessions and verification tokens that expired before now.
    ///
    /// # Returns
    /// Number of sessions and of verification tokens removed
    pub async fn purge_expired(&self) -> Result<(u64, u64), AuthError> {
        let now = Utc::now();
        let sessions = self.sessions.delete_expired(now).await?;
        let verifications = self.verifications.delete_expired(now).await?;

        if sessions > 0 || verifications > 0 {
            tracing::info!(sessions, verifications, "Expired records purged");
        }
        Ok((sessions, verifications))
    }

    async fn send_verification_email(&self, user: &User) -> Result<(), AuthError> {
        let raw_token = self
            .create_verification(
                &user.email,
                VerificationPurpose::EmailVerification,
                self.settings.email_verification_expires_in,
            )
            .await?;
        let url = self.link("/verify-email", &[("token", &raw_token)])?;

        self.deliver(EmailMessage::email_verification(&user.email, &url))
            .await;
        Ok(())
    }
}

#[async_trait]
impl<UR, SR, CR, VR, ES> AuthProvider for AuthService<UR, SR, CR, VR, ES>
where
    UR: UserRepository,
    SR: SessionRepository,
    CR: CredentialRepository,
    VR: VerificationRepository,
    ES: EmailSender,
{
    async fn resolve_session(&self, raw_token: &str) -> Result<Option<AuthSession>, AuthError> {
        if raw_token.is_empty() {
            return Ok(None);
        }

        let Some(session) = self
            .sessions
            .find_by_token_hash(&token::digest(raw_token))
            .await?
        else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            return Ok(None);
        }

        Ok(self
            .users
            .find_by_id(&session.user_id)
            .await?
            .map(|user| AuthSession { user, session }))
    }

    async fn issue_session(
        &self,
        user: User,
        client: ClientInfo,
    ) -> Result<IssuedSession, AuthError> {
        let raw_token = token::generate()?;
        let now = Utc::now();

        let session = self
            .sessions
            .create(Session {
                id: SessionId::new(),
                user_id: user.id,
                token_hash: token::digest(&raw_token),
                expires_at: now + self.settings.session_expires_in,
                created_at: now,
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            })
            .await?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "Session issued");
        Ok(IssuedSession {
            token: raw_token,
            session,
            user,
        })
    }

    async fn verify_credential(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let stored = self
            .credentials
            .find_password_hash(&user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if self.password_hasher.verify(password, &stored)? {
            Ok(user)
        } else {
            tracing::warn!(user_id = %user.id, "Password mismatch");
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn sign_up(
        &self,
        command: SignUpCommand,
        client: ClientInfo,
    ) -> Result<SignUpOutcome, AuthError> {
        if self.settings.disable_sign_up {
            return Err(AuthError::SignUpDisabled);
        }

        let password_hash = self.hash_new_password(&command.password)?;

        if self.users.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists(command.email.to_string()));
        }

        let user = self
            .credentials
            .create_user_with_password(
                User::register(
                    NewUser {
                        name: command.name,
                        email: command.email,
                        phone: command.phone,
                        image: command.image,
                        email_verified: false,
                    },
                    Utc::now(),
                ),
                &password_hash,
            )
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        // the account is usable without the email, so a failure here only loses the link
        if self.settings.send_verification_on_sign_up {
            if let Err(e) = self.send_verification_email(&user).await {
                tracing::error!(
                    user_id = %user.id,
                    error = %e,
                    "Failed to issue verification email"
                );
            }
        }

        let session = if self.settings.auto_sign_in {
            Some(self.issue_session(user.clone(), client).await?)
        } else {
            None
        };

        Ok(SignUpOutcome { user, session })
    }

    async fn sign_out(&self, raw_token: &str) -> Result<(), AuthError> {
        if raw_token.is_empty() {
            return Ok(());
        }
        self.sessions
            .delete_by_token_hash(&token::digest(raw_token))
            .await
    }

    async fn send_magic_link(
        &self,
        email: &EmailAddress,
        callback_url: Option<&str>,
    ) -> Result<(), AuthError> {
        let raw_token = self
            .create_verification(
                email,
                VerificationPurpose::MagicLink,
                self.settings.magic_link_expires_in,
            )
            .await?;

        let mut query = vec![("token", raw_token.as_str())];
        if let Some(callback_url) = callback_url {
            query.push(("callbackURL", callback_url));
        }
        let url = self.link("/magic-link/verify", &query)?;

        self.deliver(EmailMessage::magic_link(email, &url)).await;
        Ok(())
    }

    async fn verify_magic_link(
        &self,
        raw_token: &str,
        client: ClientInfo,
    ) -> Result<IssuedSession, AuthError> {
        let verification = self
            .consume_verification(raw_token, VerificationPurpose::MagicLink)
            .await?;
        let email = EmailAddress::new(verification.identifier)?;
        let now = Utc::now();

        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.email_verified => user,
            Some(user) => self
                .users
                .mark_email_verified(&user.id, now)
                .await?
                .unwrap_or(user),
            None if self.settings.disable_sign_up => {
                tracing::debug!("Magic link for unknown email while sign-up is disabled");
                return Err(AuthError::SignUpDisabled);
            }
            None => {
                let user = self
                    .users
                    .create(User::register(
                        NewUser {
                            name: email.local_part().to_string(),
                            email,
                            phone: None,
                            image: None,
                            email_verified: true,
                        },
                        now,
                    ))
                    .await?;
                tracing::info!(user_id = %user.id, "User registered through magic link");
                user
            }
        };

        self.issue_session(user, client).await
    }

    async fn request_password_reset(
        &self,
        email: &EmailAddress,
        redirect_to: Option<&str>,
    ) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let raw_token = self
            .create_verification(
                &user.email,
                VerificationPurpose::PasswordReset,
                self.settings.reset_password_expires_in,
            )
            .await?;

        let path = format!("/reset-password/{raw_token}");
        let query: Vec<(&str, &str)> = redirect_to
            .map(|redirect| vec![("callbackURL", redirect)])
            .unwrap_or_default();
        let url = self.link(&path, &query)?;

        self.deliver(EmailMessage::password_reset(&user.email, &url))
            .await;
        Ok(())
    }

    async fn check_reset_token(&self, raw_token: &str) -> Result<bool, AuthError> {
        Ok(self
            .verifications
            .find(&token::digest(raw_token), VerificationPurpose::PasswordReset)
            .await?
            .is_some_and(|verification| !verification.is_expired(Utc::now())))
    }

    async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<(), AuthError> {
        let password_hash = self.hash_new_password(new_password)?;

        let verification = self
            .consume_verification(raw_token, VerificationPurpose::PasswordReset)
            .await?;
        let email = EmailAddress::new(verification.identifier)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.credentials
            .upsert_password(&user.id, &password_hash, Utc::now())
            .await?;
        let revoked = self.sessions.delete_for_user(&user.id).await?;

        tracing::info!(user_id = %user.id, revoked, "Password reset");
        Ok(())
    }

    async fn change_password(
        &self,
        auth_session: &AuthSession,
        current_password: &str,
        new_password: &str,
        revoke_other_sessions: bool,
    ) -> Result<User, AuthError> {
        let user = &auth_session.user;

        let stored = self
            .credentials
            .find_password_hash(&user.id)
            .await?
            .ok_or(AuthError::InvalidPassword)?;
        if !self.password_hasher.verify(current_password, &stored)? {
            return Err(AuthError::InvalidPassword);
        }

        let password_hash = self.hash_new_password(new_password)?;
        self.credentials
            .upsert_password(&user.id, &password_hash, Utc::now())
            .await?;

        if revoke_other_sessions {
            let revoked = self
                .sessions
                .delete_for_user_except(&user.id, &auth_session.session.id)
                .await?;
            tracing::info!(user_id = %user.id, revoked, "Other sessions revoked");
        }

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(user.clone())
    }

    async fn verify_email(&self, raw_token: &str) -> Result<User, AuthError> {
        let verification = self
            .consume_verification(raw_token, VerificationPurpose::EmailVerification)
            .await?;
        let email = EmailAddress::new(verification.identifier)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .mark_email_verified(&user.id, Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(user)
    }

    fn issue_token(&self, auth_session: &AuthSession) -> Result<String, AuthError> {
        let user = &auth_session.user;
        let claims = SessionClaims::new(
            user.id,
            user.email.as_str(),
            user.name.as_str(),
            user.is_admin,
            self.jwt_handler.issuer(),
            Utc::now(),
            self.settings.jwt_expires_in,
        );

        Ok(self.jwt_handler.encode(&claims)?)
    }

    fn jwks(&self) -> serde_json::Value {
        serde_json::to_value(self.jwt_handler.published_keys())
            .unwrap_or_else(|_| serde_json::json!({ "keys": [] }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::auth::errors::EmailDeliveryError;
    use crate::domain::user::models::UpdateProfileCommand;
    use crate::domain::user::models::UserId;
    use crate::user::errors::UserError;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
            async fn list_all(&self) -> Result<Vec<User>, UserError>;
            async fn update_profile(&self, id: &UserId, command: &UpdateProfileCommand, updated_at: DateTime<Utc>) -> Result<Option<User>, UserError>;
            async fn set_admin(&self, id: &UserId, is_admin: bool, updated_at: DateTime<Utc>) -> Result<Option<User>, UserError>;
            async fn mark_email_verified(&self, id: &UserId, updated_at: DateTime<Utc>) -> Result<Option<User>, UserError>;
        }
    }

    mock! {
        pub TestSessionRepository {}

        #[async_trait]
        impl SessionRepository for TestSessionRepository {
            async fn create(&self, session: Session) -> Result<Session, AuthError>;
            async fn find_by_token_hash(&self, token_hash: &[u8]) -> Result<Option<Session>, AuthError>;
            async fn delete_by_token_hash(&self, token_hash: &[u8]) -> Result<(), AuthError>;
            async fn delete_for_user(&self, user_id: &UserId) -> Result<u64, AuthError>;
            async fn delete_for_user_except(&self, user_id: &UserId, keep: &SessionId) -> Result<u64, AuthError>;
            async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
        }
    }

    mock! {
        pub TestCredentialRepository {}

        #[async_trait]
        impl CredentialRepository for TestCredentialRepository {
            async fn create_user_with_password(&self, user: User, password_hash: &str) -> Result<User, AuthError>;
            async fn upsert_password(&self, user_id: &UserId, password_hash: &str, updated_at: DateTime<Utc>) -> Result<(), AuthError>;
            async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, AuthError>;
        }
    }

    mock! {
        pub TestVerificationRepository {}

        #[async_trait]
        impl VerificationRepository for TestVerificationRepository {
            async fn create(&self, verification: Verification) -> Result<Verification, AuthError>;
            async fn find(&self, token_hash: &[u8], purpose: VerificationPurpose) -> Result<Option<Verification>, AuthError>;
            async fn consume(&self, token_hash: &[u8], purpose: VerificationPurpose) -> Result<Option<Verification>, AuthError>;
            async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
        }
    }

    mock! {
        pub TestEmailSender {}

        #[async_trait]
        impl EmailSender for TestEmailSender {
            async fn send(&self, message: &EmailMessage) -> Result<(), EmailDeliveryError>;
        }
    }

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
    const BASE_URL: &str = "http://localhost:8000/api/auth";

    struct Mocks {
        users: MockTestUserRepository,
        sessions: MockTestSessionRepository,
        credentials: MockTestCredentialRepository,
        verifications: MockTestVerificationRepository,
        email_sender: MockTestEmailSender,
        settings: AuthSettings,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockTestUserRepository::new(),
                sessions: MockTestSessionRepository::new(),
                credentials: MockTestCredentialRepository::new(),
                verifications: MockTestVerificationRepository::new(),
                email_sender: MockTestEmailSender::new(),
                settings: AuthSettings::with_defaults(BASE_URL),
            }
        }

        fn into_service(
            self,
        ) -> AuthService<
            MockTestUserRepository,
            MockTestSessionRepository,
            MockTestCredentialRepository,
            MockTestVerificationRepository,
            MockTestEmailSender,
        > {
            AuthService::new(
                Arc::new(self.users),
                Arc::new(self.sessions),
                Arc::new(self.credentials),
                Arc::new(self.verifications),
                Arc::new(self.email_sender),
                JwtHandler::new(SECRET, "http://localhost:8000"),
                self.settings,
            )
        }
    }

    fn email(value: &str) -> EmailAddress {
        EmailAddress::new(value.to_string()).unwrap()
    }

    fn sample_user(address: &str, email_verified: bool) -> User {
        User::register(
            NewUser {
                name: "Jane Doe".to_string(),
                email: email(address),
                phone: None,
                image: None,
                email_verified,
            },
            Utc::now(),
        )
    }

    fn session_for(user: &User, raw_token: &str, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: SessionId::new(),
            user_id: user.id,
            token_hash: token::digest(raw_token),
            expires_at: now + expires_in,
            created_at: now,
            ip_address: None,
            user_agent: None,
        }
    }

    fn verification(address: &str, purpose: VerificationPurpose, expires_in: Duration) -> Verification {
        let now = Utc::now();
        Verification {
            id: Uuid::new_v4(),
            identifier: address.to_string(),
            purpose,
            token_hash: token::digest("raw"),
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_resolve_session_unknown_token() {
        let mut mocks = Mocks::new();
        mocks
            .sessions
            .expect_find_by_token_hash()
            .times(1)
            .returning(|_| Ok(None));
        mocks.users.expect_find_by_id().times(0);

        let service = mocks.into_service();

        assert!(service.resolve_session("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_session_empty_token_skips_store() {
        let mut mocks = Mocks::new();
        mocks.sessions.expect_find_by_token_hash().times(0);

        let service = mocks.into_service();

        assert!(service.resolve_session("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_session_expired_is_absent_and_not_deleted() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let session = session_for(&user, "tok", Duration::seconds(-1));

        mocks
            .sessions
            .expect_find_by_token_hash()
            .times(1)
            .returning(move |_| Ok(Some(session.clone())));
        mocks.sessions.expect_delete_by_token_hash().times(0);
        mocks.users.expect_find_by_id().times(0);

        let service = mocks.into_service();

        assert!(service.resolve_session("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_session_success() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let session = session_for(&user, "tok", Duration::days(1));
        let expected_hash = token::digest("tok");
        let (returned_user, returned_session) = (user.clone(), session.clone());

        mocks
            .sessions
            .expect_find_by_token_hash()
            .withf(move |hash| hash == expected_hash.as_slice())
            .times(1)
            .returning(move |_| Ok(Some(returned_session.clone())));
        mocks
            .users
            .expect_find_by_id()
            .with(eq(user.id))
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        let service = mocks.into_service();

        let resolved = service.resolve_session("tok").await.unwrap().unwrap();
        assert_eq!(resolved.user, user);
        assert_eq!(resolved.session, session);
    }

    #[tokio::test]
    async fn test_resolve_session_storage_failure() {
        let mut mocks = Mocks::new();
        mocks
            .sessions
            .expect_find_by_token_hash()
            .times(1)
            .returning(|_| Err(AuthError::DatabaseError("pool timed out".to_string())));

        let service = mocks.into_service();

        assert!(matches!(
            service.resolve_session("tok").await,
            Err(AuthError::DatabaseError(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_credential_wrong_password() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let stored = PasswordHasher::new().hash("password123").unwrap();

        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .credentials
            .expect_find_password_hash()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let service = mocks.into_service();

        let result = service
            .verify_credential(&email("jane@example.com"), "password124")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_verify_credential_unknown_email() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        mocks.credentials.expect_find_password_hash().times(0);

        let service = mocks.into_service();

        let result = service
            .verify_credential(&email("ghost@example.com"), "password123")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_verify_credential_success() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let returned_user = user.clone();
        let stored = PasswordHasher::new().hash("password123").unwrap();

        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));
        mocks
            .credentials
            .expect_find_password_hash()
            .with(eq(user.id))
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let service = mocks.into_service();

        let verified = service
            .verify_credential(&email("jane@example.com"), "password123")
            .await
            .unwrap();
        assert_eq!(verified, user);
    }

    #[tokio::test]
    async fn test_sign_up_disabled() {
        let mut mocks = Mocks::new();
        mocks.settings.disable_sign_up = true;
        mocks.credentials.expect_create_user_with_password().times(0);

        let service = mocks.into_service();

        let result = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("jane@example.com"),
                    password: "password123".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::SignUpDisabled)));
    }

    #[tokio::test]
    async fn test_sign_up_short_password() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().times(0);
        mocks.credentials.expect_create_user_with_password().times(0);

        let service = mocks.into_service();

        let result = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("jane@example.com"),
                    password: "short".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::PasswordTooShort { min: 8 })));
    }

    #[tokio::test]
    async fn test_sign_up_existing_email() {
        let mut mocks = Mocks::new();
        let existing = sample_user("jane@example.com", true);

        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        mocks.credentials.expect_create_user_with_password().times(0);

        let service = mocks.into_service();

        let result = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("jane@example.com"),
                    password: "password123".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_sign_up_creates_user_credential_and_session() {
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        mocks
            .credentials
            .expect_create_user_with_password()
            .withf(|user, hash| {
                user.name == "Jane"
                    && user.email.as_str() == "jane@example.com"
                    && !user.is_admin
                    && !user.email_verified
                    && hash.starts_with("$argon2id$")
            })
            .times(1)
            .returning(|user, _| Ok(user));
        mocks
            .verifications
            .expect_create()
            .withf(|verification| {
                verification.purpose == VerificationPurpose::EmailVerification
                    && verification.identifier == "jane@example.com"
            })
            .times(1)
            .returning(|verification| Ok(verification));
        mocks
            .email_sender
            .expect_send()
            .withf(|message| {
                message.subject == "Verify your email"
                    && message
                        .text
                        .starts_with("Click the link to verify your email: http://localhost:8000/api/auth/verify-email?token=")
            })
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .sessions
            .expect_create()
            .withf(|session| session.ip_address.as_deref() == Some("10.0.0.1"))
            .times(1)
            .returning(|session| Ok(session));

        let service = mocks.into_service();

        let outcome = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("Jane@Example.com"),
                    password: "password123".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo {
                    ip_address: Some("10.0.0.1".to_string()),
                    user_agent: None,
                },
            )
            .await
            .unwrap();

        let issued = outcome.session.expect("auto sign-in session");
        assert_eq!(issued.session.user_id, outcome.user.id);
        assert_eq!(issued.session.token_hash, token::digest(&issued.token));
    }

    #[tokio::test]
    async fn test_sign_up_survives_mail_failure() {
        let mut mocks = Mocks::new();
        mocks.settings.auto_sign_in = false;

        mocks
            .users
            .expect_find_by_email()
            .returning(|_| Ok(None));
        mocks
            .credentials
            .expect_create_user_with_password()
            .returning(|user, _| Ok(user));
        mocks
            .verifications
            .expect_create()
            .returning(|verification| Ok(verification));
        mocks.email_sender.expect_send().times(1).returning(|_| {
            Err(EmailDeliveryError::Rejected {
                status: 401,
                body: "bad key".to_string(),
            })
        });
        mocks.sessions.expect_create().times(0);

        let service = mocks.into_service();

        let outcome = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("jane@example.com"),
                    password: "password123".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo::default(),
            )
            .await
            .unwrap();
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_storage_failure_sends_nothing() {
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_email()
            .returning(|_| Ok(None));
        mocks
            .credentials
            .expect_create_user_with_password()
            .times(1)
            .returning(|_, _| Err(AuthError::DatabaseError("connection reset".to_string())));
        mocks.verifications.expect_create().times(0);
        mocks.email_sender.expect_send().times(0);
        mocks.sessions.expect_create().times(0);

        let service = mocks.into_service();

        let result = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("jane@example.com"),
                    password: "password123".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_sign_up_survives_verification_store_failure() {
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_email()
            .returning(|_| Ok(None));
        mocks
            .credentials
            .expect_create_user_with_password()
            .returning(|user, _| Ok(user));
        mocks
            .verifications
            .expect_create()
            .times(1)
            .returning(|_| Err(AuthError::DatabaseError("disk full".to_string())));
        mocks.email_sender.expect_send().times(0);
        mocks
            .sessions
            .expect_create()
            .times(1)
            .returning(|session| Ok(session));

        let service = mocks.into_service();

        let outcome = service
            .sign_up(
                SignUpCommand {
                    name: "Jane".to_string(),
                    email: email("jane@example.com"),
                    password: "password123".to_string(),
                    phone: None,
                    image: None,
                },
                ClientInfo::default(),
            )
            .await
            .unwrap();
        assert!(outcome.session.is_some());
    }

    #[tokio::test]
    async fn test_sign_out_deletes_by_digest() {
        let mut mocks = Mocks::new();
        let expected_hash = token::digest("tok");

        mocks
            .sessions
            .expect_delete_by_token_hash()
            .withf(move |hash| hash == expected_hash.as_slice())
            .times(1)
            .returning(|_| Ok(()));

        let service = mocks.into_service();

        service.sign_out("tok").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_magic_link_builds_verify_url() {
        let mut mocks = Mocks::new();

        mocks
            .verifications
            .expect_create()
            .withf(|verification| {
                verification.purpose == VerificationPurpose::MagicLink
                    && verification.expires_at - verification.created_at == Duration::seconds(300)
            })
            .times(1)
            .returning(|verification| Ok(verification));
        mocks
            .email_sender
            .expect_send()
            .withf(|message| {
                message.subject == "Sign in to your account"
                    && message.text.contains("/api/auth/magic-link/verify?token=")
                    && message
                        .text
                        .ends_with("&callbackURL=http%3A%2F%2Flocalhost%3A3000%2Fdashboard")
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = mocks.into_service();

        service
            .send_magic_link(
                &email("jane@example.com"),
                Some("http://localhost:3000/dashboard"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verify_magic_link_expired() {
        let mut mocks = Mocks::new();

        mocks.verifications.expect_consume().times(1).returning(|_, purpose| {
            Ok(Some(verification(
                "jane@example.com",
                purpose,
                Duration::seconds(-5),
            )))
        });
        mocks.sessions.expect_create().times(0);

        let service = mocks.into_service();

        let result = service
            .verify_magic_link("raw", ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_verify_magic_link_registers_new_user() {
        let mut mocks = Mocks::new();

        mocks
            .verifications
            .expect_consume()
            .with(always(), eq(VerificationPurpose::MagicLink))
            .times(1)
            .returning(|_, purpose| {
                Ok(Some(verification(
                    "new.person@example.com",
                    purpose,
                    Duration::minutes(5),
                )))
            });
        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        mocks
            .users
            .expect_create()
            .withf(|user| user.name == "new.person" && user.email_verified)
            .times(1)
            .returning(|user| Ok(user));
        mocks
            .sessions
            .expect_create()
            .times(1)
            .returning(|session| Ok(session));

        let service = mocks.into_service();

        let issued = service
            .verify_magic_link("raw", ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(issued.user.email.as_str(), "new.person@example.com");
    }

    #[tokio::test]
    async fn test_verify_magic_link_unknown_email_with_sign_up_disabled() {
        let mut mocks = Mocks::new();
        mocks.settings.disable_sign_up = true;

        mocks.verifications.expect_consume().times(1).returning(|_, purpose| {
            Ok(Some(verification(
                "new.person@example.com",
                purpose,
                Duration::minutes(5),
            )))
        });
        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        mocks.users.expect_create().times(0);
        mocks.sessions.expect_create().times(0);

        let service = mocks.into_service();

        let result = service
            .verify_magic_link("raw", ClientInfo::default())
            .await;
        assert!(matches!(result, Err(AuthError::SignUpDisabled)));
    }

    #[tokio::test]
    async fn test_verify_magic_link_existing_user_with_sign_up_disabled() {
        let mut mocks = Mocks::new();
        mocks.settings.disable_sign_up = true;
        let existing = sample_user("jane@example.com", true);

        mocks.verifications.expect_consume().returning(|_, purpose| {
            Ok(Some(verification(
                "jane@example.com",
                purpose,
                Duration::minutes(5),
            )))
        });
        mocks
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        mocks
            .sessions
            .expect_create()
            .times(1)
            .returning(|session| Ok(session));

        let service = mocks.into_service();

        let issued = service
            .verify_magic_link("raw", ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(issued.user.email.as_str(), "jane@example.com");
    }

    #[tokio::test]
    async fn test_purge_expired_clears_both_stores() {
        let mut mocks = Mocks::new();
        let started = Utc::now();

        mocks
            .sessions
            .expect_delete_expired()
            .withf(move |now| *now >= started)
            .times(1)
            .returning(|_| Ok(3));
        mocks
            .verifications
            .expect_delete_expired()
            .times(1)
            .returning(|_| Ok(1));

        let service = mocks.into_service();

        assert_eq!(service.purge_expired().await.unwrap(), (3, 1));
    }

    #[tokio::test]
    async fn test_request_password_reset_unknown_email_is_silent() {
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        mocks.verifications.expect_create().times(0);
        mocks.email_sender.expect_send().times(0);

        let service = mocks.into_service();

        service
            .request_password_reset(&email("ghost@example.com"), Some("/auth/reset-password"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_request_password_reset_emails_link() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);

        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .verifications
            .expect_create()
            .withf(|verification| verification.purpose == VerificationPurpose::PasswordReset)
            .times(1)
            .returning(|verification| Ok(verification));
        mocks
            .email_sender
            .expect_send()
            .withf(|message| {
                message.subject == "Reset your password"
                    && message.text.contains("/api/auth/reset-password/")
                    && message.text.ends_with("?callbackURL=%2Fauth%2Freset-password")
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = mocks.into_service();

        service
            .request_password_reset(&email("jane@example.com"), Some("/auth/reset-password"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_invalid_token() {
        let mut mocks = Mocks::new();

        mocks
            .verifications
            .expect_consume()
            .times(1)
            .returning(|_, _| Ok(None));
        mocks.credentials.expect_upsert_password().times(0);
        mocks.sessions.expect_delete_for_user().times(0);

        let service = mocks.into_service();

        let result = service.reset_password("bogus", "newpassword1").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reset_password_short_password_keeps_token() {
        let mut mocks = Mocks::new();
        mocks.verifications.expect_consume().times(0);

        let service = mocks.into_service();

        let result = service.reset_password("raw", "short").await;
        assert!(matches!(result, Err(AuthError::PasswordTooShort { .. })));
    }

    #[tokio::test]
    async fn test_reset_password_revokes_every_session() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let user_id = user.id;

        mocks.verifications.expect_consume().times(1).returning(|_, purpose| {
            Ok(Some(verification(
                "jane@example.com",
                purpose,
                Duration::minutes(30),
            )))
        });
        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .credentials
            .expect_upsert_password()
            .withf(move |id, hash, _| *id == user_id && hash.starts_with("$argon2id$"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks
            .sessions
            .expect_delete_for_user()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(3));

        let service = mocks.into_service();

        service.reset_password("raw", "newpassword1").await.unwrap();
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let session = session_for(&user, "tok", Duration::days(1));
        let stored = PasswordHasher::new().hash("password123").unwrap();

        mocks
            .credentials
            .expect_find_password_hash()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        mocks.credentials.expect_upsert_password().times(0);

        let service = mocks.into_service();

        let result = service
            .change_password(
                &AuthSession { user, session },
                "not-my-password",
                "newpassword1",
                false,
            )
            .await;
        assert!(matches!(result, Err(AuthError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_change_password_revokes_other_sessions() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", true);
        let session = session_for(&user, "tok", Duration::days(1));
        let (user_id, session_id) = (user.id, session.id);
        let stored = PasswordHasher::new().hash("password123").unwrap();

        mocks
            .credentials
            .expect_find_password_hash()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        mocks
            .credentials
            .expect_upsert_password()
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks
            .sessions
            .expect_delete_for_user_except()
            .with(eq(user_id), eq(session_id))
            .times(1)
            .returning(|_, _| Ok(2));

        let service = mocks.into_service();

        let changed = service
            .change_password(
                &AuthSession { user, session },
                "password123",
                "newpassword1",
                true,
            )
            .await
            .unwrap();
        assert_eq!(changed.id, user_id);
    }

    #[tokio::test]
    async fn test_verify_email_marks_user() {
        let mut mocks = Mocks::new();
        let user = sample_user("jane@example.com", false);
        let user_id = user.id;
        let verified = User {
            email_verified: true,
            ..user.clone()
        };

        mocks.verifications.expect_consume().times(1).returning(|_, purpose| {
            Ok(Some(verification(
                "jane@example.com",
                purpose,
                Duration::minutes(30),
            )))
        });
        mocks
            .users
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        mocks
            .users
            .expect_mark_email_verified()
            .withf(move |id, _| *id == user_id)
            .times(1)
            .returning(move |_, _| Ok(Some(verified.clone())));

        let service = mocks.into_service();

        let user = service.verify_email("raw").await.unwrap();
        assert!(user.email_verified);
    }

    #[tokio::test]
    async fn test_issue_token_carries_user_claims() {
        let service = Mocks::new().into_service();
        let mut user = sample_user("jane@example.com", true);
        user.is_admin = true;
        let session = session_for(&user, "tok", Duration::days(1));

        let jwt = service
            .issue_token(&AuthSession {
                user: user.clone(),
                session,
            })
            .unwrap();

        let claims = JwtHandler::new(SECRET, "http://localhost:8000")
            .decode(&jwt)
            .unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "jane@example.com");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_jwks_is_empty_for_symmetric_keys() {
        let service = Mocks::new().into_service();

        assert_eq!(service.jwks(), serde_json::json!({ "keys": [] }));
    }
}
