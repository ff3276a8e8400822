//! Aggregates module
pub mod product;
pub mod cart;
pub mod checkout;
pub mod order;

pub use product::{Category, Product};
pub use cart::{Cart, CartLine};
pub use checkout::{BankAccount, Checkout, CheckoutStep, DeliveryMethod, OrderForm, PaymentInstructions, STORE_PICKUP_ADDRESS};
pub use order::{OrderLine, OrderRequest, ProductSnapshot};
