//! Checkout Aggregate
//!
//! A three-step wizard over an [`OrderForm`]:
//!
//! ```text
//! CustomerInfo -> DeliveryMethod -> PaymentProof -> Submitting -> (closed | PaymentProof)
//! ```
//!
//! Forward moves are gated on the form, backward moves always succeed and keep
//! what was typed. A failed submission lands back on `PaymentProof` with the
//! form untouched so the customer can simply try again.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::cart::Cart;
use crate::domain::events::{CheckoutEvent, DomainEvent};
use crate::domain::value_objects::{ContactNumber, Money, ProofOfPayment};
use crate::gateway::{OrderGateway, OrderId};
use crate::{Result, StorefrontError, ValidationError};

/// Address recorded for orders collected at the shop.
pub const STORE_PICKUP_ADDRESS: &str = "Store Pickup";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Pickup,
    Delivery,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pickup => "pickup", Self::Delivery => "delivery" }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    CustomerInfo,
    DeliveryMethod,
    PaymentProof,
    Submitting,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CustomerInfo => "customer info",
            Self::DeliveryMethod => "delivery method",
            Self::PaymentProof => "payment proof",
            Self::Submitting => "submitting",
        };
        f.write_str(name)
    }
}

/// What the customer has entered so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderForm {
    full_name: String,
    contact_number: String,
    delivery_method: DeliveryMethod,
    address: String,
    proof_of_payment: Option<ProofOfPayment>,
}

impl OrderForm {
    pub fn new(
        full_name: impl Into<String>,
        contact_number: impl Into<String>,
        delivery_method: DeliveryMethod,
        address: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            contact_number: contact_number.into(),
            delivery_method,
            address: address.into(),
            proof_of_payment: None,
        }
    }

    pub fn with_proof(mut self, proof: ProofOfPayment) -> Self { self.proof_of_payment = Some(proof); self }

    pub fn full_name(&self) -> &str { &self.full_name }
    pub fn contact_number(&self) -> &str { &self.contact_number }
    pub fn delivery_method(&self) -> DeliveryMethod { self.delivery_method }
    pub fn address(&self) -> &str { &self.address }
    pub fn proof_of_payment(&self) -> Option<&ProofOfPayment> { self.proof_of_payment.as_ref() }

    pub fn check_customer_info(&self) -> std::result::Result<(), ValidationError> {
        if self.full_name.trim().is_empty() { return Err(ValidationError::MissingFullName); }
        ContactNumber::parse(&self.contact_number).map(|_| ())
    }

    pub fn check_delivery(&self) -> std::result::Result<(), ValidationError> {
        match self.delivery_method {
            DeliveryMethod::Delivery if self.address.trim().is_empty() => Err(ValidationError::MissingAddress),
            _ => Ok(()),
        }
    }

    /// Everything needed to submit, including the proof of payment.
    pub fn check_complete(&self) -> std::result::Result<(), ValidationError> {
        self.check_customer_info()?;
        self.check_delivery()?;
        if self.proof_of_payment.is_none() { return Err(ValidationError::MissingProofOfPayment); }
        Ok(())
    }

    pub fn contact(&self) -> std::result::Result<ContactNumber, ValidationError> {
        ContactNumber::parse(&self.contact_number)
    }

    /// Shipping address, or the pickup marker for collected orders.
    pub fn resolved_address(&self) -> String {
        match self.delivery_method {
            DeliveryMethod::Pickup => STORE_PICKUP_ADDRESS.to_string(),
            DeliveryMethod::Delivery => self.address.trim().to_string(),
        }
    }
}

/// Account the customer pays into before uploading the proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankAccount {
    pub bank: String,
    pub account_name: String,
    pub account_number: String,
}

impl Default for BankAccount {
    fn default() -> Self {
        Self {
            bank: "Capitec".to_string(),
            account_name: "GOAT Clothing".to_string(),
            account_number: "1234567890".to_string(),
        }
    }
}

/// Shown on the payment step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentInstructions {
    pub account: BankAccount,
    pub reference: String,
    pub amount: Money,
}

#[derive(Debug, Default)]
pub struct Checkout {
    form: OrderForm,
    step: Option<CheckoutStep>,
    events: Vec<DomainEvent>,
}

impl Checkout {
    pub fn new() -> Self { Self::default() }

    pub fn is_open(&self) -> bool { self.step.is_some() }
    /// `None` while closed.
    pub fn step(&self) -> Option<CheckoutStep> { self.step }
    pub fn form(&self) -> &OrderForm { &self.form }

    /// Starts a fresh form. Reopening an already open wizard keeps its data.
    pub fn open(&mut self) -> Result<()> {
        match self.step {
            Some(CheckoutStep::Submitting) => Err(StorefrontError::SubmissionInProgress),
            Some(_) => Ok(()),
            None => {
                self.form = OrderForm::default();
                self.step = Some(CheckoutStep::CustomerInfo);
                Ok(())
            }
        }
    }

    /// Closes the wizard and throws the form away.
    pub fn close(&mut self) -> Result<()> {
        if self.step == Some(CheckoutStep::Submitting) { return Err(StorefrontError::SubmissionInProgress); }
        self.reset();
        Ok(())
    }

    pub fn set_full_name(&mut self, full_name: impl Into<String>) -> Result<()> {
        self.editable()?;
        self.form.full_name = full_name.into();
        Ok(())
    }

    pub fn set_contact_number(&mut self, contact_number: impl Into<String>) -> Result<()> {
        self.editable()?;
        self.form.contact_number = contact_number.into();
        Ok(())
    }

    pub fn set_delivery_method(&mut self, method: DeliveryMethod) -> Result<()> {
        self.editable()?;
        self.form.delivery_method = method;
        Ok(())
    }

    pub fn set_address(&mut self, address: impl Into<String>) -> Result<()> {
        self.editable()?;
        self.form.address = address.into();
        Ok(())
    }

    /// Attaches the proof of payment. Anything but an image or a PDF is
    /// rejected and leaves the current attachment as it was.
    pub fn attach_proof(&mut self, file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        self.editable()?;
        match ProofOfPayment::new(file_name, media_type, bytes) {
            Ok(proof) => {
                self.form.proof_of_payment = Some(proof);
                Ok(())
            }
            Err(err) => {
                if let ValidationError::UnsupportedMediaType(media_type) = &err {
                    self.raise_event(DomainEvent::Checkout(CheckoutEvent::ProofRejected { media_type: media_type.clone() }));
                }
                Err(err.into())
            }
        }
    }

    pub fn advance(&mut self) -> Result<CheckoutStep> {
        let current = self.current()?;
        let next = match current {
            CheckoutStep::CustomerInfo => {
                self.form.check_customer_info()?;
                CheckoutStep::DeliveryMethod
            }
            CheckoutStep::DeliveryMethod => {
                self.form.check_customer_info()?;
                self.form.check_delivery()?;
                CheckoutStep::PaymentProof
            }
            CheckoutStep::PaymentProof => {
                return Err(StorefrontError::StepNotAvailable { current, requested: CheckoutStep::Submitting });
            }
            CheckoutStep::Submitting => return Err(StorefrontError::SubmissionInProgress),
        };
        self.step = Some(next);
        Ok(next)
    }

    pub fn back(&mut self) -> Result<CheckoutStep> {
        let previous = match self.current()? {
            CheckoutStep::CustomerInfo | CheckoutStep::DeliveryMethod => CheckoutStep::CustomerInfo,
            CheckoutStep::PaymentProof => CheckoutStep::DeliveryMethod,
            CheckoutStep::Submitting => return Err(StorefrontError::SubmissionInProgress),
        };
        self.step = Some(previous);
        Ok(previous)
    }

    pub fn payment_instructions(&self, account: &BankAccount, cart: &Cart) -> PaymentInstructions {
        PaymentInstructions {
            account: account.clone(),
            reference: self.form.full_name.trim().to_string(),
            amount: cart.total(),
        }
    }

    /// Submits the order. On success the cart is emptied and the wizard
    /// closes; on failure the wizard returns to the payment step untouched.
    #[tracing::instrument(skip_all, fields(lines = cart.len()))]
    pub async fn submit(&mut self, cart: &mut Cart, gateway: &OrderGateway) -> Result<OrderId> {
        let current = self.current()?;
        if current == CheckoutStep::Submitting { return Err(StorefrontError::SubmissionInProgress); }
        if current != CheckoutStep::PaymentProof {
            return Err(StorefrontError::StepNotAvailable { current, requested: CheckoutStep::Submitting });
        }
        if cart.is_empty() { return Err(ValidationError::EmptyCart.into()); }
        self.form.check_complete()?;

        let outcome = {
            let guard = SubmittingGuard::enter(&mut self.step);
            let outcome = gateway.submit(cart.lines(), &self.form).await;
            guard.complete();
            outcome
        };
        match outcome {
            Ok(order_id) => {
                tracing::info!(order_id = %order_id, "order submitted");
                cart.clear();
                self.reset();
                self.raise_event(DomainEvent::Checkout(CheckoutEvent::OrderSubmitted { order_id: order_id.clone() }));
                Ok(order_id)
            }
            Err(err) => {
                tracing::error!(error = %err, "order submission failed");
                self.step = Some(CheckoutStep::PaymentProof);
                self.raise_event(DomainEvent::Checkout(CheckoutEvent::SubmissionFailed { message: err.user_message() }));
                Err(err)
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn current(&self) -> Result<CheckoutStep> { self.step.ok_or(StorefrontError::WizardClosed) }

    fn editable(&self) -> Result<()> {
        match self.current()? {
            CheckoutStep::Submitting => Err(StorefrontError::SubmissionInProgress),
            _ => Ok(()),
        }
    }

    fn reset(&mut self) {
        self.form = OrderForm::default();
        self.step = None;
    }

    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// Holds the wizard in `Submitting` while the gateway call is pending. If the
/// call is abandoned (the future dropped, e.g. by a timeout) the wizard goes
/// back to `PaymentProof` so the customer can retry.
struct SubmittingGuard<'a> {
    step: &'a mut Option<CheckoutStep>,
    pending: bool,
}

impl<'a> SubmittingGuard<'a> {
    fn enter(step: &'a mut Option<CheckoutStep>) -> Self {
        *step = Some(CheckoutStep::Submitting);
        Self { step, pending: true }
    }

    fn complete(mut self) { self.pending = false; }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if self.pending {
            tracing::warn!("order submission abandoned before it completed");
            *self.step = Some(CheckoutStep::PaymentProof);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::{Category, Product};
    use crate::domain::events::NotificationLevel;
    use crate::gateway::testing::{MemoryStorage, ScriptedOrders, StalledStorage};
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::time::Duration;

    fn filled_cart() -> Cart {
        let mut cart = Cart::default();
        let hoodie = Product::new("h1", "GOAT Premium Hoodie", "Premium hoodie", Money::zar(Decimal::new(39999, 2)), "hoodie-1.jpeg", Category::Hoodies).unwrap();
        cart.add_item(&hoodie, None);
        cart.take_events();
        cart
    }

    fn at_payment_step(method: DeliveryMethod) -> Checkout {
        let mut checkout = Checkout::new();
        checkout.open().unwrap();
        checkout.set_full_name("Thabo Mokoena").unwrap();
        checkout.set_contact_number("+27 82 555 0101").unwrap();
        checkout.advance().unwrap();
        checkout.set_delivery_method(method).unwrap();
        if method == DeliveryMethod::Delivery {
            checkout.set_address("12 Long Street, Cape Town, 8001").unwrap();
        }
        checkout.advance().unwrap();
        checkout
    }

    fn gateway(storage: &Arc<MemoryStorage>, orders: &Arc<ScriptedOrders>) -> OrderGateway {
        OrderGateway::new(storage.clone(), orders.clone())
    }

    #[test]
    fn test_customer_info_gate() {
        let mut checkout = Checkout::new();
        checkout.open().unwrap();
        assert!(matches!(checkout.advance(), Err(StorefrontError::Validation(ValidationError::MissingFullName))));
        checkout.set_full_name("Thabo").unwrap();
        checkout.set_contact_number("   ").unwrap();
        assert!(matches!(checkout.advance(), Err(StorefrontError::Validation(ValidationError::MissingContactNumber))));
        checkout.set_contact_number("0825550101").unwrap();
        assert_eq!(checkout.advance().unwrap(), CheckoutStep::DeliveryMethod);
    }

    #[test]
    fn test_delivery_requires_address() {
        let mut checkout = Checkout::new();
        checkout.open().unwrap();
        checkout.set_full_name("Thabo").unwrap();
        checkout.set_contact_number("0825550101").unwrap();
        checkout.advance().unwrap();
        checkout.set_delivery_method(DeliveryMethod::Delivery).unwrap();
        assert!(matches!(checkout.advance(), Err(StorefrontError::Validation(ValidationError::MissingAddress))));
        assert_eq!(checkout.step(), Some(CheckoutStep::DeliveryMethod));
        checkout.set_delivery_method(DeliveryMethod::Pickup).unwrap();
        assert_eq!(checkout.advance().unwrap(), CheckoutStep::PaymentProof);
    }

    #[test]
    fn test_back_keeps_values() {
        let mut checkout = at_payment_step(DeliveryMethod::Delivery);
        let before = checkout.form().clone();
        assert_eq!(checkout.back().unwrap(), CheckoutStep::DeliveryMethod);
        assert_eq!(checkout.back().unwrap(), CheckoutStep::CustomerInfo);
        assert_eq!(checkout.form(), &before);
    }

    #[test]
    fn test_cleared_name_blocks_payment_step() {
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        checkout.back().unwrap();
        checkout.set_full_name("").unwrap();
        assert!(checkout.advance().is_err());
        assert_eq!(checkout.step(), Some(CheckoutStep::DeliveryMethod));
    }

    #[test]
    fn test_rejects_text_file() {
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        let err = checkout.attach_proof("notes.txt", "text/plain", b"paid".to_vec()).unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ValidationError::UnsupportedMediaType(_))));
        assert!(checkout.form().proof_of_payment().is_none());
        let events = checkout.take_events();
        let n = events[0].notification().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.title, "Invalid file type");
    }

    #[test]
    fn test_closed_wizard_rejects_edits() {
        let mut checkout = Checkout::new();
        assert!(matches!(checkout.set_full_name("x"), Err(StorefrontError::WizardClosed)));
        checkout.open().unwrap();
        checkout.set_full_name("Thabo").unwrap();
        checkout.close().unwrap();
        checkout.open().unwrap();
        assert_eq!(checkout.form(), &OrderForm::default());
    }

    #[test]
    fn test_payment_instructions() {
        let checkout = at_payment_step(DeliveryMethod::Pickup);
        let instructions = checkout.payment_instructions(&BankAccount::default(), &filled_cart());
        assert_eq!(instructions.reference, "Thabo Mokoena");
        assert_eq!(instructions.amount.to_string(), "R399.99");
        assert_eq!(instructions.account.bank, "Capitec");
    }

    #[tokio::test]
    async fn test_submit_requires_proof() {
        let (storage, orders) = (Arc::new(MemoryStorage::default()), Arc::new(ScriptedOrders::accepting("abc")));
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        let mut cart = filled_cart();
        let err = checkout.submit(&mut cart, &gateway(&storage, &orders)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ValidationError::MissingProofOfPayment)));
        assert_eq!(checkout.step(), Some(CheckoutStep::PaymentProof));
        assert!(orders.received().is_empty());
    }

    #[tokio::test]
    async fn test_submit_success_clears_cart_and_closes() {
        let storage = Arc::new(MemoryStorage::default());
        let orders = Arc::new(ScriptedOrders::accepting("0192f1c4-7a3b-7c2e-9d1a-5b6c7d8e9f00"));
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        checkout.attach_proof("slip.png", "image/png", vec![0x89, 0x50]).unwrap();
        let mut cart = filled_cart();

        let order_id = checkout.submit(&mut cart, &gateway(&storage, &orders)).await.unwrap();
        assert_eq!(order_id.short(), "0192f1c4");
        assert!(cart.is_empty());
        assert!(!checkout.is_open());
        assert_eq!(checkout.form(), &OrderForm::default());

        let n = checkout.take_events().pop().unwrap().notification().unwrap();
        assert_eq!(n.title, "Order Submitted Successfully!");
        assert!(n.description.starts_with("Order #0192f1c4 "));
    }

    #[tokio::test]
    async fn test_remote_failure_returns_to_payment_step() {
        let storage = Arc::new(MemoryStorage::default());
        let orders = Arc::new(ScriptedOrders::failing(StorefrontError::Remote("orders table unavailable".into())));
        let mut checkout = at_payment_step(DeliveryMethod::Delivery);
        checkout.attach_proof("slip.pdf", "application/pdf", b"%PDF".to_vec()).unwrap();
        let mut cart = filled_cart();
        let lines_before = cart.lines().to_vec();
        let form_before = checkout.form().clone();

        let err = checkout.submit(&mut cart, &gateway(&storage, &orders)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Remote(_)));
        assert_eq!(checkout.step(), Some(CheckoutStep::PaymentProof));
        assert_eq!(checkout.form(), &form_before);
        assert_eq!(cart.lines(), &lines_before[..]);
        assert_eq!(storage.stored().len(), 1);

        let n = checkout.take_events().pop().unwrap().notification().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.title, "Order Submission Failed");
        assert_eq!(n.description, "orders table unavailable");
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let storage = Arc::new(MemoryStorage::failing("bucket not found"));
        let orders = Arc::new(ScriptedOrders::accepting("0192f1c4-0000"));
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        checkout.attach_proof("slip.jpg", "image/jpeg", vec![1, 2, 3]).unwrap();
        let mut cart = filled_cart();

        assert!(matches!(checkout.submit(&mut cart, &gateway(&storage, &orders)).await, Err(StorefrontError::Upload(_))));
        assert!(orders.received().is_empty());

        let healthy = Arc::new(MemoryStorage::default());
        assert!(checkout.submit(&mut cart, &gateway(&healthy, &orders)).await.is_ok());
        assert_eq!(orders.received().len(), 1);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_submit_returns_to_payment_step() {
        let orders = Arc::new(ScriptedOrders::accepting("0192f1c4-1111"));
        let stalled = OrderGateway::new(Arc::new(StalledStorage), orders.clone());
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        checkout.attach_proof("slip.png", "image/png", vec![1, 2]).unwrap();
        let mut cart = filled_cart();
        let form_before = checkout.form().clone();

        let abandoned = tokio::time::timeout(Duration::from_millis(50), checkout.submit(&mut cart, &stalled)).await;
        assert!(abandoned.is_err());
        assert_eq!(checkout.step(), Some(CheckoutStep::PaymentProof));
        assert_eq!(checkout.form(), &form_before);
        assert_eq!(cart.len(), 1);
        assert!(orders.received().is_empty());

        assert_eq!(checkout.back().unwrap(), CheckoutStep::DeliveryMethod);
        assert_eq!(checkout.advance().unwrap(), CheckoutStep::PaymentProof);
        let healthy = Arc::new(MemoryStorage::default());
        let order_id = checkout.submit(&mut cart, &gateway(&healthy, &orders)).await.unwrap();
        assert_eq!(order_id.as_str(), "0192f1c4-1111");
        assert!(cart.is_empty());
        assert!(!checkout.is_open());
    }

    #[tokio::test]
    async fn test_submit_from_wrong_step() {
        let (storage, orders) = (Arc::new(MemoryStorage::default()), Arc::new(ScriptedOrders::accepting("abc")));
        let mut checkout = Checkout::new();
        let mut cart = filled_cart();
        assert!(matches!(checkout.submit(&mut cart, &gateway(&storage, &orders)).await, Err(StorefrontError::WizardClosed)));
        checkout.open().unwrap();
        assert!(matches!(
            checkout.submit(&mut cart, &gateway(&storage, &orders)).await,
            Err(StorefrontError::StepNotAvailable { current: CheckoutStep::CustomerInfo, .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_empty_cart() {
        let (storage, orders) = (Arc::new(MemoryStorage::default()), Arc::new(ScriptedOrders::accepting("abc")));
        let mut checkout = at_payment_step(DeliveryMethod::Pickup);
        checkout.attach_proof("slip.png", "image/png", vec![1]).unwrap();
        let mut cart = Cart::default();
        let err = checkout.submit(&mut cart, &gateway(&storage, &orders)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ValidationError::EmptyCart)));
        assert!(storage.stored().is_empty());
    }
}
