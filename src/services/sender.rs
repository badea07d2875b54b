use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Telegram API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded, retry after {0}s")]
    RateLimited(u64),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid sender configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait MessageSender: Send + Sync + std::fmt::Debug {
    /// Sends one text message to the configured destination.
    ///
    /// # Errors
    /// Returns `SendError` if the transport fails or the service rejects the message.
    async fn send_text(&self, text: &str) -> Result<(), SendError>;

    /// Checks that the service accepts the configured credentials.
    ///
    /// # Errors
    /// Returns `SendError` if the service is unreachable or rejects the credentials.
    async fn probe(&self) -> Result<(), SendError>;
}

/// Builds a sender bound to the process-wide destination.
pub trait SenderFactory: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns `SendError::Config` if a client cannot be built from the configuration.
    fn connect(&self) -> Result<Arc<dyn MessageSender>, SendError>;
}
