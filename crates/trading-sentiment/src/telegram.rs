//! Telegram Bot API client and the notifier seam used by the watcher.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trading_core::error::NewsError;

const API_URL: &str = "https://api.telegram.org";
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Destination for alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NewsError>;
}

/// Prints messages to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, text: &str) -> Result<(), NewsError> {
        println!("{}\n", text);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends Markdown messages to one chat.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NewsError> {
        Self::with_base_url(API_URL, token, chat_id)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, NewsError> {
        let token = token.into();
        let chat_id = chat_id.into();
        if token.trim().is_empty() {
            return Err(NewsError::Configuration(format!("{} not set", TOKEN_ENV)));
        }
        if chat_id.trim().is_empty() {
            return Err(NewsError::Configuration(format!("{} not set", CHAT_ID_ENV)));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| NewsError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
            chat_id,
        })
    }

    /// Token and chat id from `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`.
    pub fn from_env() -> Result<Self, NewsError> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| NewsError::Configuration(format!("{} not set", TOKEN_ENV)))?;
        let chat_id = std::env::var(CHAT_ID_ENV)
            .map_err(|_| NewsError::Configuration(format!("{} not set", CHAT_ID_ENV)))?;
        Self::new(token, chat_id)
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    pub async fn send_message(&self, text: &str) -> Result<(), NewsError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };
        let response = self
            .client
            .post(self.endpoint("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| NewsError::Request(e.to_string()))?;
        let status = response.status();
        let reply: ApiResponse = response
            .json()
            .await
            .map_err(|e| NewsError::Telegram(format!("{}: {}", status, e)))?;
        if !reply.ok {
            return Err(NewsError::Telegram(
                reply
                    .description
                    .unwrap_or_else(|| format!("sendMessage failed with {}", status)),
            ));
        }
        debug!(chat_id = %self.chat_id, chars = text.len(), "Telegram message sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, text: &str) -> Result<(), NewsError> {
        self.send_message(text).await
    }
}
