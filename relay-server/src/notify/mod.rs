//! Outbound notifications.
//!
//! Verified orders are delivered to a Telegram chat through the Bot API.

pub mod telegram;

pub use telegram::{SendMessageRequest, TelegramEnvelope, TelegramNotifier};
