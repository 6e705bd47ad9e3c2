//! Telegram Bot API client for order notifications.
//!
//! One `sendMessage` call per notification; no retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::RelayError;
use crate::Config;

/// Body of a `sendMessage` request.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
}

/// Envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
pub struct TelegramEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sends notifications to the configured Telegram chat.
///
/// Cheap to clone; the HTTP client is pooled internally.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    config: Arc<Config>,
}

impl TelegramNotifier {
    /// Create a notifier with a fresh HTTP client.
    pub fn new(config: Arc<Config>) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a notifier around an existing HTTP client.
    pub fn with_client(client: Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Send `text` to the configured chat.
    ///
    /// The bot token and chat id are looked up at call time; missing values
    /// are a configuration error, not a delivery error.
    pub async fn notify(&self, text: &str) -> Result<(), RelayError> {
        let token = self
            .config
            .telegram_bot_token
            .as_deref()
            .ok_or(RelayError::Configuration("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = self
            .config
            .telegram_chat_id
            .as_deref()
            .ok_or(RelayError::Configuration("TELEGRAM_CHAT_ID"))?;

        let url = format!("{}/bot{}/sendMessage", self.config.telegram_api_base, token);
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        info!(
            chat_id = %chat_id,
            text_length = text.len(),
            "telegram_send_starting"
        );

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                // reqwest includes the URL (and so the token) in its Display output
                let e = e.without_url();
                if e.is_timeout() {
                    error!(error = %e, "telegram_send_timeout");
                } else {
                    error!(error = %e, "telegram_send_request_error");
                }
                return Err(RelayError::Transport(e));
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            error!(
                status_code = status.as_u16(),
                body = %body,
                "telegram_send_rejected"
            );
            return Err(RelayError::Delivery {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<TelegramEnvelope>(&body) {
            Ok(envelope) if envelope.ok => {
                info!(status_code = status.as_u16(), "telegram_send_complete");
                Ok(())
            }
            Ok(envelope) => {
                error!(
                    status_code = status.as_u16(),
                    description = ?envelope.description,
                    "telegram_send_not_ok"
                );
                Err(RelayError::Delivery {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => {
                error!(
                    status_code = status.as_u16(),
                    error = %e,
                    "telegram_send_unexpected_body"
                );
                Err(RelayError::Delivery {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
