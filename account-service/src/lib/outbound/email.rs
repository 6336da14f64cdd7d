use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::domain::auth::errors::EmailDeliveryError;
use crate::domain::auth::models::EmailMessage;
use crate::domain::auth::ports::EmailSender;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Transactional mail over a JSON HTTP API authenticated with a bearer key.
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("account-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailDeliveryError> {
        let payload = SendEmailRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailDeliveryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailDeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            to = %message.to,
            subject = %message.subject,
            status = status.as_u16(),
            "Email accepted by provider"
        );

        Ok(())
    }
}
