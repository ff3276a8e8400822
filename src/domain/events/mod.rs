//! Domain events
//!
//! Aggregates queue events as they change; the presentation layer drains them
//! with `take_events()` and decides how to show the [`Notification`] each one
//! projects to.
use crate::domain::value_objects::LineId;
use crate::gateway::OrderId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { line_id: LineId, product_name: String },
    ItemRemoved { line_id: LineId },
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutEvent {
    ProofRejected { media_type: String },
    OrderSubmitted { order_id: OrderId },
    SubmissionFailed { message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel { Info, Error }

/// Toast-style message for the customer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Info, title: title.into(), description: description.into() }
    }
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, title: title.into(), description: description.into() }
    }
}

impl DomainEvent {
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::Cart(CartEvent::ItemAdded { product_name, .. }) => Some(Notification::info(
                "Added to cart!",
                format!("{} has been added to your cart.", product_name),
            )),
            Self::Cart(CartEvent::ItemRemoved { .. }) => {
                Some(Notification::info("Removed from cart", "Item has been removed from your cart."))
            }
            Self::Cart(CartEvent::Cleared) => None,
            Self::Checkout(CheckoutEvent::ProofRejected { .. }) => {
                Some(Notification::error("Invalid file type", "Please upload an image or PDF file"))
            }
            Self::Checkout(CheckoutEvent::OrderSubmitted { order_id }) => Some(Notification::info(
                "Order Submitted Successfully!",
                format!(
                    "Order #{} has been created. We'll contact you on WhatsApp to confirm.",
                    order_id.short()
                ),
            )),
            Self::Checkout(CheckoutEvent::SubmissionFailed { message }) => {
                Some(Notification::error("Order Submission Failed", message.clone()))
            }
        }
    }
}
