//! Order payload decoding.
//!
//! ## Processing Flow
//!
//! ```text
//! verified raw body → decode() → WebhookPayload::{Order, Other} → format_order_message()
//! ```

pub mod message;
pub mod types;

use tracing::info;

use crate::error::RelayError;

pub use message::format_order_message;
pub use types::{Customer, OrderEvent, WebhookPayload};

use types::RawWebhook;

/// Decode a verified webhook body.
///
/// Invalid JSON is an error. Valid JSON that is not an order (missing id,
/// name or total_price, or not an object at all) decodes to
/// [`WebhookPayload::Other`] whatever its other fields contain. Only bodies
/// that qualify as orders are parsed into typed fields.
pub fn decode(body: &[u8]) -> Result<WebhookPayload, RelayError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;

    let Some(object) = value.as_object() else {
        info!(json_type = json_type(&value), "webhook_payload_not_object");
        return Ok(WebhookPayload::Other { topic: None });
    };

    if !ORDER_FIELDS.iter().all(|field| has_value(object, field)) {
        let topic = object
            .get("topic")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        info!(topic = ?topic, "webhook_payload_not_order");
        return Ok(WebhookPayload::Other { topic });
    }

    let raw: RawWebhook = serde_json::from_value(value)?;
    let payload = raw.classify();

    if let WebhookPayload::Order(order) = &payload {
        info!(
            order_id = %order.id,
            order_name = %order.name,
            has_customer = order.customer.is_some(),
            "webhook_payload_order"
        );
    }

    Ok(payload)
}

/// Fields whose presence makes a payload an order.
const ORDER_FIELDS: [&str; 3] = ["id", "name", "total_price"];

fn has_value(object: &serde_json::Map<String, serde_json::Value>, field: &str) -> bool {
    object.get(field).is_some_and(|v| !v.is_null())
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_order() {
        let body = br##"{"id":1001,"name":"#1001","total_price":"25.00","currency":"USD","customer":{"first_name":"Ana"}}"##;

        let payload = decode(body).unwrap();

        let WebhookPayload::Order(order) = payload else {
            panic!("expected an order");
        };
        assert_eq!(order.id, "1001");
        assert_eq!(order.name, "#1001");
        assert_eq!(order.total_price, "25.00");
        assert_eq!(order.currency.as_deref(), Some("USD"));
        assert_eq!(
            order.customer.and_then(|c| c.first_name).as_deref(),
            Some("Ana")
        );
    }

    #[test]
    fn test_decode_missing_total_is_not_order() {
        let body = br##"{"id":1001,"name":"#1001","currency":"USD"}"##;
        assert_eq!(
            decode(body).unwrap(),
            WebhookPayload::Other { topic: None }
        );
    }

    #[test]
    fn test_decode_null_field_is_not_order() {
        let body = br##"{"id":1001,"name":null,"total_price":"1.00"}"##;
        assert!(matches!(decode(body).unwrap(), WebhookPayload::Other { .. }));
    }

    #[test]
    fn test_decode_topic_only() {
        let body = br#"{"topic":"app/uninstalled"}"#;
        assert_eq!(
            decode(body).unwrap(),
            WebhookPayload::Other {
                topic: Some("app/uninstalled".to_string())
            }
        );
    }

    #[test]
    fn test_decode_non_object_json() {
        assert_eq!(decode(b"[1,2,3]").unwrap(), WebhookPayload::Other { topic: None });
        assert_eq!(decode(b"\"hi\"").unwrap(), WebhookPayload::Other { topic: None });
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = decode(b"{\"id\": 1001,").unwrap_err();
        assert!(matches!(err, RelayError::PayloadDecode(_)));

        let err = decode(b"").unwrap_err();
        assert!(matches!(err, RelayError::PayloadDecode(_)));
    }

    #[test]
    fn test_decode_non_order_ignores_field_types() {
        assert_eq!(
            decode(br#"{"topic":{"a":1}}"#).unwrap(),
            WebhookPayload::Other { topic: None }
        );
        assert_eq!(
            decode(br#"{"customer":"bob"}"#).unwrap(),
            WebhookPayload::Other { topic: None }
        );
        assert_eq!(
            decode(br#"{"email":["x@y"],"topic":"customers/update"}"#).unwrap(),
            WebhookPayload::Other {
                topic: Some("customers/update".to_string())
            }
        );
    }

    #[test]
    fn test_decode_wrong_field_shape() {
        let err = decode(br##"{"id":1,"name":"#1","total_price":"1","customer":"bob"}"##).unwrap_err();
        assert!(matches!(err, RelayError::PayloadDecode(_)));
    }
}
