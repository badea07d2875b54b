use crate::config::{ParseMode, TelegramConfig};
use crate::services::sender::{MessageSender, SendError, SenderFactory};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

/// Maps a Bot API reply onto a send result. A reply only counts as delivered when the
/// HTTP status is a success and the envelope says `ok`.
fn interpret_response(status: StatusCode, body: &str) -> Result<(), SendError> {
    let parsed: Option<ApiResponse> = serde_json::from_str(body).ok();

    match parsed {
        Some(resp) if resp.ok && status.is_success() => Ok(()),
        Some(resp) => {
            if status == StatusCode::TOO_MANY_REQUESTS
                && let Some(retry_after) = resp.parameters.and_then(|p| p.retry_after)
            {
                return Err(SendError::RateLimited(retry_after));
            }
            let description = resp.description.unwrap_or_else(|| format!("request failed with status {status}"));
            Err(SendError::Api(description))
        }
        None => Err(SendError::Api(format!("unexpected response with status {status}"))),
    }
}

/// Sends messages through the Bot API `sendMessage` method.
pub struct TelegramSender {
    http: reqwest::Client,
    send_message_url: Url,
    get_me_url: Url,
    chat_id: String,
    parse_mode: ParseMode,
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The bot token is part of the URL path.
        f.debug_struct("TelegramSender")
            .field("host", &self.send_message_url.host_str())
            .field("chat_id", &self.chat_id)
            .field("parse_mode", &self.parse_mode)
            .finish_non_exhaustive()
    }
}

impl TelegramSender {
    /// Builds a sender for the given configuration.
    ///
    /// # Errors
    /// Returns `SendError::Config` if the API base URL is not a valid http(s) URL.
    pub fn new(http: reqwest::Client, config: &TelegramConfig) -> Result<Self, SendError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| SendError::Config(format!("invalid Telegram API URL {:?}: {e}", config.api_url)))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(SendError::Config(format!("unsupported Telegram API URL {:?}", config.api_url)));
        }

        let method_url = |method: &str| {
            let raw = format!("{}/bot{}/{method}", base.as_str().trim_end_matches('/'), config.bot_token);
            Url::parse(&raw).map_err(|e| SendError::Config(format!("cannot build {method} URL: {e}")))
        };

        Ok(Self {
            http,
            send_message_url: method_url("sendMessage")?,
            get_me_url: method_url("getMe")?,
            chat_id: config.chat_id.clone(),
            parse_mode: config.parse_mode,
        })
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send_text(&self, text: &str) -> Result<(), SendError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: self.parse_mode.as_api_value(),
            disable_web_page_preview: true,
        };

        let response = self
            .http
            .post(self.send_message_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SendError::Transport(e.without_url()))?;
        interpret_response(status, &body)
    }

    async fn probe(&self) -> Result<(), SendError> {
        let response =
            self.http.get(self.get_me_url.clone()).send().await.map_err(|e| SendError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SendError::Transport(e.without_url()))?;
        interpret_response(status, &body)
    }
}

/// Hands out `TelegramSender`s sharing one connection pool.
#[derive(Clone)]
pub struct TelegramConnector {
    http: reqwest::Client,
    config: TelegramConfig,
}

impl std::fmt::Debug for TelegramConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConnector")
            .field("api_url", &self.config.api_url)
            .field("chat_id", &self.config.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramConnector {
    /// # Errors
    /// Returns `SendError::Transport` if the HTTP client cannot be initialized.
    pub fn new(config: TelegramConfig) -> Result<Self, SendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }
}

impl SenderFactory for TelegramConnector {
    fn connect(&self) -> Result<Arc<dyn MessageSender>, SendError> {
        let sender = TelegramSender::new(self.http.clone(), &self.config)?;
        Ok(Arc::new(sender))
    }
}
