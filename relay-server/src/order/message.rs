//! Telegram message template for new orders.
//!
//! Rendered for Telegram's legacy `Markdown` parse mode.

use super::types::OrderEvent;

/// Render the notification text for an order.
///
/// Field order: id, name, total with currency, customer name, then email
/// and financial status when the order carries them.
pub fn format_order_message(order: &OrderEvent) -> String {
    let customer = order.customer.as_ref();

    let first_name = customer
        .and_then(|c| c.first_name.as_deref())
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown");
    let last_name = customer
        .and_then(|c| c.last_name.as_deref())
        .unwrap_or("");

    let total = match order.currency.as_deref().filter(|s| !s.is_empty()) {
        Some(currency) => format!("{} {}", order.total_price, currency),
        None => order.total_price.clone(),
    };

    let mut lines = vec![
        "🛒 *New Shopify Order!*".to_string(),
        String::new(),
        format!("*Order ID:* {}", escape_markdown(&order.id)),
        format!("*Name:* {}", escape_markdown(&order.name)),
        format!("*Total:* {}", escape_markdown(&total)),
        format!(
            "*Customer:* {}",
            escape_markdown(format!("{first_name} {last_name}").trim_end())
        ),
    ];

    let email = customer
        .and_then(|c| c.email.as_deref())
        .or(order.email.as_deref())
        .filter(|s| !s.is_empty());
    if let Some(email) = email {
        lines.push(format!("*Email:* {}", escape_markdown(email)));
    }

    if let Some(status) = order.financial_status.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("*Status:* {}", escape_markdown(status)));
    }

    lines.join("\n")
}

/// Escape the characters legacy Markdown treats as entity delimiters.
fn escape_markdown(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
