//! Webhook endpoint handlers.
//!
//! The order webhook handler runs each request through:
//! 1. Signature verification on the raw body
//! 2. JSON decode and order classification
//! 3. Telegram notification for orders
//!
//! Every failure is translated into a status code here.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::RelayError;
use crate::notify::TelegramNotifier;
use crate::order::{decode, format_order_message, WebhookPayload};
use crate::web::signature::{SignatureVerifier, SHOPIFY_HMAC_HEADER};
use crate::Config;

/// Header naming the webhook topic, e.g. "orders/create".
pub const SHOPIFY_TOPIC_HEADER: &str = "x-shopify-topic";

/// Header naming the sending shop.
pub const SHOPIFY_SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: Arc<SignatureVerifier>,
    pub notifier: TelegramNotifier,
}

impl AppState {
    /// Build state from configuration, selecting the verification strategy once.
    pub fn new(config: Config) -> Result<Self, RelayError> {
        let config = Arc::new(config);
        let verifier = Arc::new(SignatureVerifier::from_config(&config));
        let notifier = TelegramNotifier::new(config.clone())?;
        Ok(Self {
            config,
            verifier,
            notifier,
        })
    }
}

// =============================================================================
// Liveness
// =============================================================================

/// Root liveness/info endpoint.
pub async fn index() -> &'static str {
    "🚀 Shopify Telegram webhook relay is running!"
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Order Webhook
// =============================================================================

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// What a successfully handled webhook led to.
#[derive(Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Order forwarded to Telegram
    Notified { order_id: String },
    /// Valid payload that is not an order
    Ignored,
}

/// Shopify order webhook endpoint.
///
/// The body is taken as raw bytes so the signature is computed over exactly
/// what Shopify sent.
pub async fn order_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let topic = header_str(&headers, SHOPIFY_TOPIC_HEADER);
    let shop = header_str(&headers, SHOPIFY_SHOP_DOMAIN_HEADER);

    info!(
        topic = ?topic,
        shop = ?shop,
        body_length = body.len(),
        has_signature = headers.contains_key(SHOPIFY_HMAC_HEADER),
        verification = state.verifier.mode(),
        "shopify_webhook_received"
    );

    match handle_webhook(&state, &headers, &body).await {
        Ok(WebhookOutcome::Notified { order_id }) => {
            info!(order_id = %order_id, "shopify_order_notified");
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "notified",
                    order_id: Some(order_id),
                    detail: None,
                }),
            )
        }
        Ok(WebhookOutcome::Ignored) => {
            info!(topic = ?topic, "shopify_webhook_ignored");
            (
                StatusCode::OK,
                Json(WebhookResponse {
                    status: "ignored",
                    order_id: None,
                    detail: None,
                }),
            )
        }
        Err(RelayError::Unauthorized) => {
            warn!(topic = ?topic, shop = ?shop, "shopify_webhook_unauthorized");
            (
                StatusCode::UNAUTHORIZED,
                Json(WebhookResponse {
                    status: "unauthorized",
                    order_id: None,
                    detail: None,
                }),
            )
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "shopify_webhook_failed");
            (
                e.status_code(),
                Json(WebhookResponse {
                    status: "error",
                    order_id: None,
                    detail: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Verify, decode and notify. Stops at the first failure.
pub async fn handle_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookOutcome, RelayError> {
    let signature = header_str(headers, SHOPIFY_HMAC_HEADER);
    if !state.verifier.verify(body, signature) {
        return Err(RelayError::Unauthorized);
    }

    let order = match decode(body)? {
        WebhookPayload::Order(order) => order,
        WebhookPayload::Other { .. } => return Ok(WebhookOutcome::Ignored),
    };

    let message = format_order_message(&order);
    state.notifier.notify(&message).await?;

    Ok(WebhookOutcome::Notified { order_id: order.id })
}

/// Header value as text; absent or non-ASCII values read as `None`.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TELEGRAM_API_BASE;
    use crate::web::create_router;
    use crate::web::signature::compute_signature;
    use axum::body::Body;
    use axum::http::Request;
    use mockito::{Matcher, Server};
    use serde_json::Value;
    use tower::ServiceExt;

    const SECRET: &str = "shpss_test_secret";
    const ORDER_BODY: &str = r##"{"id":1001,"name":"#1001","total_price":"25.00","currency":"USD","customer":{"first_name":"Ana"}}"##;

    fn config(api_base: &str, deploy_env: &str) -> Config {
        Config {
            port: 0,
            shopify_webhook_secret: Some(SECRET.to_string()),
            telegram_bot_token: Some("TOKEN".to_string()),
            telegram_chat_id: Some("-100123".to_string()),
            telegram_api_base: api_base.to_string(),
            deploy_env: deploy_env.to_string(),
            webhook_paths: vec!["/".to_string(), "/webhook".to_string()],
            request_timeout_ms: 2000,
        }
    }

    fn signed_request(path: &str, body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header(SHOPIFY_TOPIC_HEADER, "orders/create");
        if let Some(signature) = signature {
            builder = builder.header(SHOPIFY_HMAC_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_valid_order_is_notified() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({ "chat_id": "-100123" })),
                Matcher::Regex("1001".to_string()),
                Matcher::Regex("#1001".to_string()),
                Matcher::Regex("25.00 USD".to_string()),
                Matcher::Regex("Ana".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let state = AppState::new(config(&server.url(), "production")).unwrap();
        let signature = compute_signature(ORDER_BODY.as_bytes(), SECRET).unwrap();

        let (status, body) = send(state, signed_request("/", ORDER_BODY, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "notified");
        assert_eq!(body["order_id"], "1001");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_signature_is_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let state = AppState::new(config(&server.url(), "production")).unwrap();
        let forged = compute_signature(ORDER_BODY.as_bytes(), "wrong-secret").unwrap();

        let (status, body) =
            send(state.clone(), signed_request("/webhook", ORDER_BODY, Some(&forged))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "unauthorized");

        let (status, _) = send(state, signed_request("/webhook", ORDER_BODY, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_order_is_acknowledged() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let state = AppState::new(config(&server.url(), "production")).unwrap();
        let payload = r#"{"topic":"app/uninstalled"}"#;
        let signature = compute_signature(payload.as_bytes(), SECRET).unwrap();

        let (status, body) = send(state, signed_request("/", payload, Some(&signature))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_telegram_rejection_is_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(403)
            .with_body(r#"{"ok":false,"description":"Forbidden: bot was blocked"}"#)
            .create_async()
            .await;

        let state = AppState::new(config(&server.url(), "production")).unwrap();
        let signature = compute_signature(ORDER_BODY.as_bytes(), SECRET).unwrap();

        let (status, body) = send(state, signed_request("/", ORDER_BODY, Some(&signature))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["detail"].as_str().unwrap().contains("403"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_server_error() {
        let state = AppState::new(config(DEFAULT_TELEGRAM_API_BASE, "production")).unwrap();
        let payload = r##"{"id": 1001, "name": "#1001""##;
        let signature = compute_signature(payload.as_bytes(), SECRET).unwrap();

        let (status, body) = send(state, signed_request("/", payload, Some(&signature))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("invalid webhook payload"));
    }

    #[tokio::test]
    async fn test_missing_bot_token_is_server_error() {
        let mut config = config(DEFAULT_TELEGRAM_API_BASE, "production");
        config.telegram_bot_token = None;
        let state = AppState::new(config).unwrap();
        let signature = compute_signature(ORDER_BODY.as_bytes(), SECRET).unwrap();

        let (status, body) = send(state, signed_request("/", ORDER_BODY, Some(&signature))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("TELEGRAM_BOT_TOKEN"));
    }

    #[tokio::test]
    async fn test_bypass_outside_production() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .expect(1)
            .create_async()
            .await;

        let state = AppState::new(config(&server.url(), "preview")).unwrap();
        assert_eq!(state.verifier.mode(), "pass_through");

        let (status, body) = send(state, signed_request("/webhook", ORDER_BODY, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "notified");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_handle_webhook_outcomes() {
        let state = AppState::new(config(DEFAULT_TELEGRAM_API_BASE, "production")).unwrap();
        let payload = br#"{"id":5,"name":"draft"}"#;
        let signature = compute_signature(payload, SECRET).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(SHOPIFY_HMAC_HEADER, signature.parse().unwrap());

        let outcome = handle_webhook(&state, &headers, payload).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);

        let err = handle_webhook(&state, &HeaderMap::new(), payload)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
    }
}
