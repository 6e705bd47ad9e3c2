//! Shopify webhook payload types.
//!
//! Only the fields the notification uses are modelled; everything else in
//! the Shopify order document is ignored.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A decoded webhook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookPayload {
    /// An order carrying an id, a name and a total
    Order(OrderEvent),
    /// Anything else; acknowledged without notifying
    Other { topic: Option<String> },
}

/// An order ready to be rendered into a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEvent {
    /// Numeric order id, kept as text
    pub id: String,
    /// Display name, e.g. "#1001"
    pub name: String,
    /// Order total as sent by Shopify, e.g. "25.00"
    pub total_price: String,
    /// ISO currency code
    pub currency: Option<String>,
    /// Order contact email
    pub email: Option<String>,
    /// Payment state, e.g. "paid" or "pending"
    pub financial_status: Option<String>,
    /// Customer record, absent for guest or POS orders
    pub customer: Option<Customer>,
}

/// Customer attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Loosely-typed view of the body used for classification.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawWebhook {
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub total_price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl RawWebhook {
    /// Split into an order (all of id, name, total_price present) or not.
    pub(crate) fn classify(self) -> WebhookPayload {
        match (self.id, self.name, self.total_price) {
            (Some(id), Some(name), Some(total_price)) => WebhookPayload::Order(OrderEvent {
                id,
                name,
                total_price,
                currency: self.currency,
                email: self.email,
                financial_status: self.financial_status,
                customer: self.customer,
            }),
            _ => WebhookPayload::Other { topic: self.topic },
        }
    }
}

/// Accept a JSON string or number as text. Shopify sends ids as numbers and
/// prices as strings, but neither is guaranteed across API versions.
fn scalar_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}
