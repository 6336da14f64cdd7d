use async_trait::async_trait;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

const API_VERSION_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Session missing or rejected; the caller should navigate to the login page
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Request(e.to_string())
    }
}

/// Account as returned by the account service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub phone: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial profile change; empty fields are left alone by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    user: Profile,
}

#[derive(Debug, Deserialize)]
struct ProfileMessage {
    data: Profile,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Calls the dashboard forms make against the account service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_email(&self, email: &str, password: &str) -> Result<Profile, ClientError>;

    async fn sign_up_email(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Profile, ClientError>;

    async fn send_magic_link(&self, email: &str, callback_url: &str) -> Result<(), ClientError>;

    async fn forget_password(&self, email: &str, redirect_to: &str) -> Result<(), ClientError>;

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ClientError>;

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError>;

    async fn sign_out(&self) -> Result<(), ClientError>;

    async fn get_session(&self) -> Result<Option<Profile>, ClientError>;

    async fn get_profile(&self) -> Result<Profile, ClientError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ClientError>;

    async fn list_users(&self) -> Result<Vec<Profile>, ClientError>;
}

/// Cookie-carrying client for the account service.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Request(e.to_string()))
    }

    fn auth(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.client.request(method, self.url(&format!("/api/auth{path}"))?))
    }

    fn api(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self
            .client
            .request(method, self.url(&format!("{API_VERSION_PREFIX}{path}"))?))
    }

    /// Send an `/api/v1` request. A 401 drops the local session first.
    async fn send_api(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.sign_out().await {
                tracing::warn!(error = %e, "Sign-out after 401 failed");
            }
            return Err(ClientError::Unauthorized);
        }
        ensure_success(response).await
    }

    async fn send_auth(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        ensure_success(request.send().await?).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Something went wrong")
                .to_string()
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn sign_in_email(&self, email: &str, password: &str) -> Result<Profile, ClientError> {
        let request = self
            .auth(reqwest::Method::POST, "/sign-in/email")?
            .json(&json!({ "email": email, "password": password }));
        let envelope: SessionEnvelope = parse(self.send_auth(request).await?).await?;
        Ok(envelope.user)
    }

    async fn sign_up_email(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Profile, ClientError> {
        let request = self
            .auth(reqwest::Method::POST, "/sign-up/email")?
            .json(&json!({ "name": name, "email": email, "password": password }));
        let envelope: SessionEnvelope = parse(self.send_auth(request).await?).await?;
        Ok(envelope.user)
    }

    async fn send_magic_link(&self, email: &str, callback_url: &str) -> Result<(), ClientError> {
        let request = self
            .auth(reqwest::Method::POST, "/sign-in/magic-link")?
            .json(&json!({ "email": email, "callbackURL": callback_url }));
        self.send_auth(request).await?;
        Ok(())
    }

    async fn forget_password(&self, email: &str, redirect_to: &str) -> Result<(), ClientError> {
        let request = self
            .auth(reqwest::Method::POST, "/forget-password")?
            .json(&json!({ "email": email, "redirectTo": redirect_to }));
        self.send_auth(request).await?;
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ClientError> {
        let request = self
            .auth(reqwest::Method::POST, "/reset-password")?
            .json(&json!({ "token": token, "newPassword": new_password }));
        self.send_auth(request).await?;
        Ok(())
    }

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let request = self
            .auth(reqwest::Method::POST, "/change-password")?
            .json(&json!({
                "currentPassword": current_password,
                "newPassword": new_password
            }));
        self.send_auth(request).await?;
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let request = self.auth(reqwest::Method::POST, "/sign-out")?;
        self.send_auth(request).await?;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Profile>, ClientError> {
        let request = self.auth(reqwest::Method::GET, "/get-session")?;
        let envelope: Option<SessionEnvelope> = parse(self.send_auth(request).await?).await?;
        Ok(envelope.map(|envelope| envelope.user))
    }

    async fn get_profile(&self) -> Result<Profile, ClientError> {
        let request = self.api(reqwest::Method::GET, "/users/profile")?;
        parse(self.send_api(request).await?).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ClientError> {
        let request = self.api(reqwest::Method::PUT, "/users/profile")?.json(update);
        let message: ProfileMessage = parse(self.send_api(request).await?).await?;
        Ok(message.data)
    }

    async fn list_users(&self) -> Result<Vec<Profile>, ClientError> {
        let request = self.api(reqwest::Method::GET, "/users")?;
        parse(self.send_api(request).await?).await
    }
}
