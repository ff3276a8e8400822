//! Environment configuration
//!
//! `.env` is loaded when present. Both configs are built from a lookup
//! function so they can be assembled without touching the process
//! environment.

use std::time::Duration;
use crate::domain::aggregates::BankAccount;
use crate::{Result, StorefrontError};

const DEFAULT_PROOF_BUCKET: &str = "order-proofs";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8083;
const DEFAULT_MAIL_FROM: &str = "GOAT Store <onboarding@resend.dev>";

/// Settings for the storefront's side of checkout.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub backend_url: String,
    pub api_key: Option<String>,
    pub proof_bucket: String,
    pub request_timeout: Duration,
    pub bank_account: BankAccount,
}

/// Settings for the order service binary.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub notify_recipient: String,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let backend_url = get("STOREFRONT_BACKEND_URL")
            .ok_or_else(|| StorefrontError::Config("Missing environment variable 'STOREFRONT_BACKEND_URL'".into()))?;
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(StorefrontError::Config(format!("STOREFRONT_BACKEND_URL must be an http(s) URL, got '{}'", backend_url)));
        }
        let defaults = BankAccount::default();
        Ok(Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            api_key: get("STOREFRONT_API_KEY"),
            proof_bucket: get("STOREFRONT_PROOF_BUCKET").unwrap_or_else(|| DEFAULT_PROOF_BUCKET.to_string()),
            request_timeout: timeout(get("STOREFRONT_REQUEST_TIMEOUT_SECS"), "STOREFRONT_REQUEST_TIMEOUT_SECS")?,
            bank_account: BankAccount {
                bank: get("STOREFRONT_BANK_NAME").unwrap_or(defaults.bank),
                account_name: get("STOREFRONT_BANK_ACCOUNT_NAME").unwrap_or(defaults.account_name),
                account_number: get("STOREFRONT_BANK_ACCOUNT_NUMBER").unwrap_or(defaults.account_number),
            },
        })
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| StorefrontError::Config(format!("Invalid PORT '{}': {}", raw, e)))?,
            None => DEFAULT_PORT,
        };
        let notify_recipient = get("ORDER_NOTIFY_EMAIL")
            .ok_or_else(|| StorefrontError::Config("Missing environment variable 'ORDER_NOTIFY_EMAIL'".into()))?;
        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            notify_recipient,
            resend_api_key: get("RESEND_API_KEY"),
            mail_from: get("ORDER_MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            request_timeout: timeout(get("MAIL_REQUEST_TIMEOUT_SECS"), "MAIL_REQUEST_TIMEOUT_SECS")?,
        })
    }
}

fn timeout(raw: Option<String>, key: &str) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw.parse::<u64>().map_err(|e| StorefrontError::Config(format!("Invalid {} '{}': {}", key, raw, e)))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    if secs == 0 {
        return Err(StorefrontError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}
