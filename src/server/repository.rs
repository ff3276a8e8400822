//! Order persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Mutex;
use uuid::Uuid;
use crate::domain::aggregates::{DeliveryMethod, OrderRequest};
use crate::{Result, StorefrontError, ValidationError};

/// An order as it is written: one `orders` row plus one `order_items` row per line.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub delivery_method: DeliveryMethod,
    pub total_amount: Decimal,
    pub proof_of_payment_url: Option<String>,
    pub items: Vec<NewOrderItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewOrderItem {
    pub product_name: String,
    pub product_description: String,
    pub quantity: i32,
    pub price: Decimal,
    pub customization: Option<String>,
}

impl NewOrder {
    /// The total is recomputed from the items rather than taken from the request.
    pub fn from_request(request: &OrderRequest) -> std::result::Result<Self, ValidationError> {
        let items = request
            .cart_items
            .iter()
            .map(|line| -> std::result::Result<NewOrderItem, ValidationError> {
                Ok(NewOrderItem {
                    product_name: line.product.name.clone(),
                    product_description: line.product.description.clone(),
                    quantity: i32::try_from(line.quantity).map_err(|_| ValidationError::AmountOutOfRange)?,
                    price: line.product.price,
                    customization: line.customization.clone(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            id: Uuid::now_v7(),
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.clone(),
            customer_phone: request.customer_phone.trim().to_string(),
            customer_address: request.customer_address.trim().to_string(),
            delivery_method: request.delivery_method,
            total_amount: request.recomputed_total()?,
            proof_of_payment_url: request.proof_of_payment_url.clone().filter(|u| !u.is_empty()),
            items,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &NewOrder) -> Result<()>;
}

pub struct PgOrderRepository {
    db: PgPool,
}

impl PgOrderRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("INSERT INTO orders (id, customer_name, customer_email, customer_phone, customer_address, delivery_method, total_amount, proof_of_payment_url, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)")
            .bind(order.id).bind(&order.customer_name).bind(&order.customer_email).bind(&order.customer_phone)
            .bind(&order.customer_address).bind(order.delivery_method.as_str()).bind(order.total_amount)
            .bind(&order.proof_of_payment_url).bind(order.created_at)
            .execute(&mut *tx).await?;
        for item in &order.items {
            sqlx::query("INSERT INTO order_items (id, order_id, product_name, product_description, quantity, price, customization) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(Uuid::now_v7()).bind(order.id).bind(&item.product_name).bind(&item.product_description)
                .bind(item.quantity).bind(item.price).bind(&item.customization)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Keeps orders for the life of the process. Used when no database is configured.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<NewOrder>>,
}

impl InMemoryOrderRepository {
    pub fn orders(&self) -> Vec<NewOrder> {
        self.orders.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &NewOrder) -> Result<()> {
        let mut orders = self.orders.lock().map_err(|_| StorefrontError::Storage("order store poisoned".into()))?;
        if orders.iter().any(|o| o.id == order.id) {
            return Err(StorefrontError::Storage(format!("duplicate order id {}", order.id)));
        }
        orders.push(order.clone());
        Ok(())
    }
}
