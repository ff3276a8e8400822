//! In-memory collaborators for exercising the gateway and the wizard.

use async_trait::async_trait;
use std::sync::Mutex;
use super::{object_name, OrderId, OrderService, ProofStorage};
use crate::domain::aggregates::OrderRequest;
use crate::domain::value_objects::ProofOfPayment;
use crate::{Result, StorefrontError};

#[derive(Default)]
pub struct MemoryStorage {
    stored: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl MemoryStorage {
    pub fn failing(message: &str) -> Self {
        Self { stored: Mutex::default(), failure: Some(message.to_string()) }
    }

    /// URLs handed out so far.
    pub fn stored(&self) -> Vec<String> { self.stored.lock().unwrap().clone() }
}

#[async_trait]
impl ProofStorage for MemoryStorage {
    async fn store(&self, proof: &ProofOfPayment) -> Result<String> {
        if let Some(message) = &self.failure {
            return Err(StorefrontError::Upload(message.clone()));
        }
        let url = format!("memory://order-proofs/{}", object_name(proof));
        self.stored.lock().unwrap().push(url.clone());
        Ok(url)
    }
}

/// Never answers, like a backend that hangs until the caller gives up.
pub struct StalledStorage;

#[async_trait]
impl ProofStorage for StalledStorage {
    async fn store(&self, _proof: &ProofOfPayment) -> Result<String> {
        std::future::pending().await
    }
}

pub struct ScriptedOrders {
    received: Mutex<Vec<OrderRequest>>,
    outcome: Result<OrderId>,
}

impl ScriptedOrders {
    pub fn accepting(order_id: &str) -> Self {
        Self { received: Mutex::default(), outcome: Ok(OrderId::new(order_id)) }
    }

    pub fn failing(err: StorefrontError) -> Self {
        Self { received: Mutex::default(), outcome: Err(err) }
    }

    pub fn received(&self) -> Vec<OrderRequest> { self.received.lock().unwrap().clone() }
}

#[async_trait]
impl OrderService for ScriptedOrders {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderId> {
        self.received.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }
}
