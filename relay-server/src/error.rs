//! Error taxonomy for webhook handling.
//!
//! Every variant is caught at the handler boundary and translated into an
//! HTTP status; none of them terminate the process.

use axum::http::StatusCode;
use thiserror::Error;

/// Failure while handling a single webhook request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Signature header missing or not matching the body.
    #[error("webhook signature verification failed")]
    Unauthorized,

    /// Body passed verification but is not valid order JSON.
    #[error("invalid webhook payload: {0}")]
    PayloadDecode(#[from] serde_json::Error),

    /// A value the notifier needs was not configured.
    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    /// Telegram answered but did not accept the message.
    #[error("telegram rejected message with status {status}: {body}")]
    Delivery { status: u16, body: String },

    /// The request to Telegram failed before a response arrived.
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RelayError {
    /// HTTP status returned to the webhook caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Unauthorized => "unauthorized",
            RelayError::PayloadDecode(_) => "payload_decode",
            RelayError::Configuration(_) => "configuration",
            RelayError::Delivery { .. } => "delivery",
            RelayError::Transport(_) => "transport",
        }
    }
}
