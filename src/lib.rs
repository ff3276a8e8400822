//! GOAT Storefront
//!
//! Catalog, cart and checkout for a small streetwear shop that takes payment
//! by bank transfer and asks the customer to upload a proof of payment.
//!
//! ## Features
//! - Static product catalog with category filtering
//! - Cart ledger with per-line customization and quantities
//! - Three-step checkout wizard (customer info, delivery, proof of payment)
//! - Order submission gateway (proof upload, then order creation)
//! - Order backend service that persists orders and emails the shop

pub mod catalog;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod server;

use thiserror::Error;

pub use catalog::Catalog;
pub use config::{ClientConfig, ServerConfig};
pub use domain::aggregates::{
    BankAccount, Cart, CartLine, Category, Checkout, CheckoutStep, DeliveryMethod, OrderForm, OrderRequest,
    PaymentInstructions, Product,
};
pub use domain::events::{DomainEvent, Notification, NotificationLevel};
pub use domain::value_objects::{Customization, LineId, Money, ProofOfPayment, Quantity};
pub use gateway::{OrderGateway, OrderId};

/// Message shown when a failure carries no description of its own.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Please try again or contact support.";

// =============================================================================
// Error Types
// =============================================================================

/// Local validation failures, caught before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Full name is required")]
    MissingFullName,

    #[error("Contact number is required")]
    MissingContactNumber,

    #[error("Delivery address is required")]
    MissingAddress,

    #[error("Proof of payment is required")]
    MissingProofOfPayment,

    #[error("Unsupported file type '{0}': please upload an image or PDF file")]
    UnsupportedMediaType(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Order amount is out of range")]
    AmountOutOfRange,
}

#[derive(Error, Debug, Clone)]
pub enum StorefrontError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Checkout is not open")]
    WizardClosed,

    #[error("An order is already being submitted")]
    SubmissionInProgress,

    #[error("Step {requested} is not available from {current}")]
    StepNotAvailable {
        current: CheckoutStep,
        requested: CheckoutStep,
    },

    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("{0}")]
    Remote(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

impl StorefrontError {
    /// The single line shown to the customer for this failure.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_FAILURE_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Whether the failure happened on the way to, or inside, a remote collaborator.
    pub fn is_submission_failure(&self) -> bool {
        matches!(self, Self::Upload(_) | Self::Remote(_) | Self::Network(_))
    }
}

impl From<sqlx::Error> for StorefrontError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
