//! Order submission payload
//!
//! The wire representation shared by the gateway (which builds it from the
//! cart and the checkout form) and the order service (which validates and
//! persists it). Field names are camelCase on the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::aggregates::cart::CartLine;
use crate::domain::aggregates::checkout::{DeliveryMethod, OrderForm};
use crate::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[validate(custom = "not_blank")]
    pub customer_name: String,
    /// Kept for backends whose schema requires an email; derived from the phone.
    #[serde(default)]
    pub customer_email: String,
    #[validate(custom = "not_blank")]
    pub customer_phone: String,
    #[validate(custom = "not_blank")]
    pub customer_address: String,
    pub delivery_method: DeliveryMethod,
    #[validate]
    pub cart_items: Vec<OrderLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_of_payment_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,
    #[validate]
    pub product: ProductSnapshot,
    #[validate(range(min = 1, max = 2147483647))]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProductSnapshot {
    pub id: String,
    #[validate(custom = "not_blank")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom = "non_negative")]
    pub price: Decimal,
}

impl OrderLine {
    /// `None` when the product of price and quantity does not fit a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> { self.product.price.checked_mul(Decimal::from(self.quantity)) }
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        let product = line.product();
        Self {
            id: line.id().to_string(),
            product: ProductSnapshot {
                id: product.id().to_string(),
                name: product.name().to_string(),
                description: product.description().to_string(),
                price: product.price().amount(),
            },
            quantity: line.quantity().value(),
            customization: line.customization().map(|c| c.to_string()),
        }
    }
}

impl OrderRequest {
    /// Projects the cart and the form into a payload. The total is always
    /// computed from the lines; the proof URL is filled in after upload.
    pub fn assemble(lines: &[CartLine], form: &OrderForm) -> Result<Self, ValidationError> {
        if lines.is_empty() { return Err(ValidationError::EmptyCart); }
        form.check_customer_info()?;
        form.check_delivery()?;
        let contact = form.contact()?;
        let cart_items: Vec<OrderLine> = lines.iter().map(OrderLine::from).collect();
        Ok(Self {
            customer_name: form.full_name().trim().to_string(),
            customer_email: contact.synthetic_email(),
            customer_phone: contact.as_str().to_string(),
            customer_address: form.resolved_address(),
            delivery_method: form.delivery_method(),
            total_amount: total_of(&cart_items)?,
            cart_items,
            proof_of_payment_url: None,
        })
    }

    pub fn recomputed_total(&self) -> Result<Decimal, ValidationError> {
        total_of(&self.cart_items)
    }
}

fn total_of(lines: &[OrderLine]) -> Result<Decimal, ValidationError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        line.line_total().and_then(|t| acc.checked_add(t)).ok_or(ValidationError::AmountOutOfRange)
    })
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(validator::ValidationError::new("negative"));
    }
    Ok(())
}
