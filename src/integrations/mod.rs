//! Outbound HTTP adapters: the Avito API and automation delivery channels.
//!
//! All adapters use the blocking `reqwest` client. Inside the Actix runtime
//! they must be constructed and used within `web::block`.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use thiserror::Error;

use crate::domain::automation::{Automation, AutomationChannel, AutomationMessage};
use crate::models::config::ServerConfig;

pub mod avito;
pub mod telegram;
pub mod webhook;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("upstream rejected the credentials")]
    Unauthorized,

    #[error("upstream rate limit exceeded")]
    RateLimited,

    #[error("upstream responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("misconfigured channel: {0}")]
    Config(String),
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;

/// Upstream endpoints and timeouts shared by the HTTP adapters.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub avito_api_url: String,
    pub telegram_api_url: String,
    pub timeout: Duration,
}

impl From<&ServerConfig> for HttpSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            avito_api_url: config.avito_api_url.clone(),
            telegram_api_url: config.telegram_api_url.clone(),
            timeout: Duration::from_secs(config.http_timeout_secs),
        }
    }
}

impl HttpSettings {
    pub fn build_client(&self) -> IntegrationResult<Client> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }
}

/// Maps non-success statuses to [`IntegrationError`] and passes the rest through.
pub(crate) fn check_status(response: Response) -> IntegrationResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IntegrationError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => Err(IntegrationError::RateLimited),
        _ => {
            let body = response.text().unwrap_or_default();
            Err(IntegrationError::Status {
                status: status.as_u16(),
                body: body.chars().take(512).collect(),
            })
        }
    }
}

/// Delivers automation messages to their channel.
#[cfg_attr(feature = "test-mocks", mockall::automock)]
pub trait AutomationDispatcher {
    fn deliver(&self, automation: &Automation, message: &AutomationMessage)
    -> IntegrationResult<()>;
}

/// Dispatcher that talks to real webhook receivers and the Telegram Bot API.
pub struct HttpDispatcher {
    client: Client,
    telegram_api_url: String,
}

impl HttpDispatcher {
    pub fn new(settings: &HttpSettings) -> IntegrationResult<Self> {
        Ok(Self {
            client: settings.build_client()?,
            telegram_api_url: settings.telegram_api_url.clone(),
        })
    }
}

impl AutomationDispatcher for HttpDispatcher {
    fn deliver(
        &self,
        automation: &Automation,
        message: &AutomationMessage,
    ) -> IntegrationResult<()> {
        match automation.channel {
            AutomationChannel::Webhook => webhook::send(
                &self.client,
                automation.target.as_str(),
                automation.secret.as_ref().map(|secret| secret.as_str()),
                message,
            ),
            AutomationChannel::Telegram => {
                let bot_token = automation.secret.as_ref().ok_or_else(|| {
                    IntegrationError::Config("telegram automation has no bot token".to_string())
                })?;
                telegram::send_message(
                    &self.client,
                    &self.telegram_api_url,
                    bot_token.as_str(),
                    automation.target.as_str(),
                    &telegram::render_text(message),
                )
            }
        }
    }
}
