//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into an immutable [`Config`] that is
//! shared by reference with the verifier and the notifier.

use std::env;
use tracing::warn;

/// Deployment environment in which signature verification is enforced.
pub const PRODUCTION_ENV: &str = "production";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shopify webhook signing secret (HMAC-SHA256 key)
    pub shopify_webhook_secret: Option<String>,

    /// Telegram bot token used to build the sendMessage URL
    pub telegram_bot_token: Option<String>,

    /// Telegram chat (or channel) that receives order notifications
    pub telegram_chat_id: Option<String>,

    /// Base URL of the Telegram Bot API
    pub telegram_api_base: String,

    /// Deployment environment; anything other than "production" disables
    /// signature verification
    pub deploy_env: String,

    /// Paths that accept webhook POSTs
    pub webhook_paths: Vec<String>,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is applied first, if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),

            shopify_webhook_secret: non_empty("SHOPIFY_WEBHOOK_SECRET"),

            telegram_bot_token: non_empty("TELEGRAM_BOT_TOKEN"),

            telegram_chat_id: non_empty("TELEGRAM_CHAT_ID"),

            telegram_api_base: non_empty("TELEGRAM_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),

            deploy_env: resolve_deploy_env(non_empty("APP_ENV"), non_empty("VERCEL_ENV")),

            webhook_paths: parse_paths("WEBHOOK_PATHS", &["/", "/webhook"]),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Whether webhook signatures must be checked.
    pub fn is_production(&self) -> bool {
        self.deploy_env.eq_ignore_ascii_case(PRODUCTION_ENV)
    }
}

/// Pick the deployment environment: `APP_ENV`, then `VERCEL_ENV`, then
/// production. Blank values count as unset.
fn resolve_deploy_env(app_env: Option<String>, vercel_env: Option<String>) -> String {
    app_env
        .filter(|v| !v.trim().is_empty())
        .or_else(|| vercel_env.filter(|v| !v.trim().is_empty()))
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| PRODUCTION_ENV.to_string())
}

/// Read a variable, treating blank values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of route paths, dropping entries that do
/// not start with '/' or that use route parameter syntax.
fn parse_paths(name: &str, default: &[&str]) -> Vec<String> {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default.iter().map(|s| s.to_string()).collect(),
    };

    let mut paths: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !part.starts_with('/') {
            warn!(env_var = name, path = %part, "Ignoring webhook path without leading slash");
            continue;
        }
        // Route syntax would mount captures or wildcards, or fail to mount at all
        if part.contains([':', '*', '{', '}']) {
            warn!(env_var = name, path = %part, "Ignoring webhook path with route parameters");
            continue;
        }
        if !paths.iter().any(|p| p == part) {
            paths.push(part.to_string());
        }
    }

    if paths.is_empty() {
        warn!(env_var = name, value = %raw, "No usable webhook paths, using default");
        return default.iter().map(|s| s.to_string()).collect();
    }

    paths
}
