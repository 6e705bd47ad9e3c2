//! Order Relay - Shopify order webhooks to Telegram.
//!
//! Shared modules for the `order-relay` binary.
//!
//! ## Architecture
//!
//! ```text
//! Shopify → POST webhook → verify HMAC → decode order → format → Telegram sendMessage
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod order;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::RelayError;
pub use notify::TelegramNotifier;
pub use order::{decode, format_order_message, OrderEvent, WebhookPayload};
pub use web::{create_router, AppState, SignatureVerifier};
