//! Web server module for handling Shopify webhooks.
//!
//! Routes:
//! - `GET /` and `GET /health`: liveness
//! - `POST` on every configured webhook path: verify, decode, notify

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub use handlers::{
    handle_webhook, health, index, order_webhook, AppState, HealthResponse, WebhookOutcome,
    WebhookResponse,
};
pub use signature::{verify_shopify_signature, SignatureVerifier, SHOPIFY_HMAC_HEADER};

/// Build the router, mounting the webhook handler on every configured path.
///
/// CORS is permissive so the endpoints can be exercised from a browser.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(health));

    let mut root_mounted = false;
    for path in &state.config.webhook_paths {
        let method_router = if path == "/" {
            root_mounted = true;
            get(index).post(order_webhook)
        } else {
            post(order_webhook)
        };
        info!(path = %path, "webhook_route_mounted");
        router = router.route(path, method_router);
    }

    if !root_mounted {
        router = router.route("/", get(index));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
