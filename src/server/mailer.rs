//! Order notification email

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use crate::domain::value_objects::Money;
use crate::server::repository::NewOrder;
use crate::{Result, StorefrontError};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Sends through the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, from: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorefrontError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client, api_key: api_key.to_string(), from: from.to_string(), endpoint: RESEND_ENDPOINT.to_string() })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self { self.endpoint = endpoint.into(); self }
}

#[derive(Serialize)]
struct ResendMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = ResendMessage { from: &self.from, to: &email.to, subject: &email.subject, html: &email.html };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| StorefrontError::Mail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorefrontError::Mail(format!("{}: {}", status, body)));
        }
        Ok(())
    }
}

/// Writes the notification to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        info!(to = ?email.to, subject = %email.subject, "order notification (not sent, no mail provider configured)");
        Ok(())
    }
}

/// The "new order" email sent to the shop.
pub fn order_notification(order: &NewOrder, recipient: &str) -> Email {
    let short_id: String = order.id.to_string().chars().take(8).collect();
    let total = Money::zar(order.total_amount);
    let items = order
        .items
        .iter()
        .map(|item| {
            let custom = item.customization.as_deref().map(|c| format!(" - {}", c)).unwrap_or_default();
            format!("- {} (Qty: {}) - {}{}", item.product_name, item.quantity, Money::zar(item.price), custom)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let proof = order
        .proof_of_payment_url
        .as_deref()
        .map(|url| format!("<p><strong>Proof of Payment:</strong> <a href=\"{0}\">{0}</a></p>", escape(url)))
        .unwrap_or_default();

    let html = format!(
        "<h2>New Order Received!</h2>\
         <p><strong>Order ID:</strong> {id}</p>\
         <h3>Customer Information:</h3>\
         <p><strong>Name:</strong> {name}</p>\
         <p><strong>Phone:</strong> {phone}</p>\
         <p><strong>Address:</strong> {address}</p>\
         <p><strong>Delivery Method:</strong> {method}</p>\
         <h3>Order Items:</h3>\
         <pre>{items}</pre>\
         <p><strong>Total Amount:</strong> {total}</p>\
         {proof}\
         <p>Please process this order as soon as possible.</p>",
        id = order.id,
        name = escape(&order.customer_name),
        phone = escape(&order.customer_phone),
        address = escape(&order.customer_address),
        method = order.delivery_method,
        items = escape(&items),
        total = total,
        proof = proof,
    );

    Email { to: vec![recipient.to_string()], subject: format!("New Order #{} - {}", short_id, total), html }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
