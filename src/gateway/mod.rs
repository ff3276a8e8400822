//! Order submission gateway
//!
//! Turns a cart and a completed checkout form into a remote order in two
//! strictly ordered calls: the proof of payment is stored first, and only
//! once that succeeds is the order created. A stored proof whose order then
//! fails to be created is left where it is.

pub mod http;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use crate::config::ClientConfig;
use crate::domain::aggregates::{CartLine, OrderForm, OrderRequest};
use crate::domain::value_objects::ProofOfPayment;
use crate::{Result, StorefrontError};

pub use http::{HttpBackend, HttpOrderService, HttpProofStorage};

/// Identifier assigned by the order service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
    /// First eight characters, as quoted to the customer.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Where proofs of payment are kept. Returns a publicly readable URL.
#[async_trait]
pub trait ProofStorage: Send + Sync {
    async fn store(&self, proof: &ProofOfPayment) -> Result<String>;
}

/// Persists an order (and notifies the shop) on the backend.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderId>;
}

#[derive(Clone)]
pub struct OrderGateway {
    storage: Arc<dyn ProofStorage>,
    orders: Arc<dyn OrderService>,
}

impl OrderGateway {
    pub fn new(storage: Arc<dyn ProofStorage>, orders: Arc<dyn OrderService>) -> Self {
        Self { storage, orders }
    }

    /// Gateway talking HTTP to the configured backend.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let backend = HttpBackend::new(config)?;
        Ok(Self::new(
            Arc::new(HttpProofStorage::new(backend.clone(), &config.proof_bucket)),
            Arc::new(HttpOrderService::new(backend)),
        ))
    }

    #[instrument(skip_all, fields(lines = lines.len(), delivery = %form.delivery_method()))]
    pub async fn submit(&self, lines: &[CartLine], form: &OrderForm) -> Result<OrderId> {
        let mut request = OrderRequest::assemble(lines, form)?;

        if let Some(proof) = form.proof_of_payment() {
            let url = self.storage.store(proof).await.map_err(as_upload_failure)?;
            tracing::debug!(%url, "proof of payment stored");
            request.proof_of_payment_url = Some(url);
        }

        let order_id = self.orders.create_order(&request).await.map_err(|err| {
            if request.proof_of_payment_url.is_some() {
                tracing::warn!(error = %err, "order creation failed after the proof was stored");
            }
            as_remote_failure(err)
        })?;
        tracing::info!(%order_id, total = %request.total_amount, "order created");
        Ok(order_id)
    }
}

/// Collision-resistant object name: `<unix-millis>-<token>[.<ext>]`.
pub fn object_name(proof: &ProofOfPayment) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    let extension = proof
        .extension()
        .map(|ext| ext.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    format!("{}-{}{}", Utc::now().timestamp_millis(), token, extension)
}

fn as_upload_failure(err: StorefrontError) -> StorefrontError {
    match err {
        StorefrontError::Upload(_) | StorefrontError::Network(_) => err,
        other => StorefrontError::Upload(other.to_string()),
    }
}

fn as_remote_failure(err: StorefrontError) -> StorefrontError {
    match err {
        StorefrontError::Remote(_) | StorefrontError::Network(_) => err,
        other => StorefrontError::Remote(other.to_string()),
    }
}
