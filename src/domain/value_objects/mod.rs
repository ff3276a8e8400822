//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ValidationError;

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn zar(amount: Decimal) -> Self { Self::new(amount, "ZAR") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_negative(&self) -> bool { self.amount.is_sign_negative() && !self.amount.is_zero() }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero("ZAR") } }

/// Rand amounts are shown as `R1499.96`, anything else with its currency code.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.amount.round_dp(2);
        match self.currency.as_str() {
            "ZAR" => write!(f, "R{:.2}", amount),
            code => write!(f, "{} {:.2}", code, amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Currency mismatch")]
    CurrencyMismatch,
}

/// Quantity of a cart line. Never zero: a line with nothing in it is removed instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }
    pub fn value(&self) -> u32 { self.0 }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }

impl TryFrom<u32> for Quantity {
    type Error = String;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "quantity must be at least 1".to_string())
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self { q.0 }
}

/// Identifier of a single cart line, distinct from the product id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(Uuid);

impl LineId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
    pub fn as_uuid(&self) -> &Uuid { &self.0 }
}

impl Default for LineId { fn default() -> Self { Self::new() } }

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color { White, Black, Red, Pink, Purple }

impl Color {
    pub const ALL: [Color; 5] = [Color::White, Color::Black, Color::Red, Color::Pink, Color::Purple];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Red => "red",
            Self::Pink => "pink",
            Self::Purple => "purple",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Size { Xs, S, M, L, Xl, Xxl }

impl Size {
    pub const ALL: [Size; 6] = [Size::Xs, Size::S, Size::M, Size::L, Size::Xl, Size::Xxl];
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Xs => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::Xl => "XL",
            Self::Xxl => "XXL",
        };
        f.write_str(name)
    }
}

/// Customer's requested modifications for one cart line.
///
/// `Display` renders the free-text form the order backend stores, e.g.
/// `"Gold stitching. Color: red, Size: M"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub color: Option<Color>,
    pub size: Option<Size>,
    pub notes: Option<String>,
}

impl Customization {
    pub fn with_color(mut self, color: Color) -> Self { self.color = Some(color); self }
    pub fn with_size(mut self, size: Size) -> Self { self.size = Some(size); self }
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() { None } else { Some(notes.trim().to_string()) };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.size.is_none() && self.notes.is_none()
    }

    /// `None` when nothing was actually chosen.
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }

    fn tags(&self) -> String {
        let color = self.color.map(|c| format!("Color: {}", c));
        let size = self.size.map(|s| format!("Size: {}", s));
        [color, size].into_iter().flatten().collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Customization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = self.tags();
        match (self.notes.as_deref(), tags.is_empty()) {
            (Some(notes), false) => write!(f, "{}. {}", notes, tags),
            (Some(notes), true) => f.write_str(notes),
            (None, _) => f.write_str(&tags),
        }
    }
}

/// Phone (WhatsApp) number the shop uses to confirm an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNumber(String);

impl ContactNumber {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() { return Err(ValidationError::MissingContactNumber); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }

    /// Email-shaped identifier for backends whose order schema insists on an email.
    pub fn synthetic_email(&self) -> String {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        format!("{}@whatsapp.local", compact)
    }
}

impl fmt::Display for ContactNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// An uploaded proof-of-payment file. Only images and PDFs are accepted.
#[derive(Clone, PartialEq, Eq)]
pub struct ProofOfPayment {
    file_name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl ProofOfPayment {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let media_type = media_type.into().trim().to_ascii_lowercase();
        if !Self::is_accepted(&media_type) {
            return Err(ValidationError::UnsupportedMediaType(media_type));
        }
        Ok(Self { file_name: file_name.into(), media_type, bytes })
    }

    pub fn is_accepted(media_type: &str) -> bool {
        media_type.starts_with("image/") || media_type == "application/pdf"
    }

    pub fn file_name(&self) -> &str { &self.file_name }
    pub fn media_type(&self) -> &str { &self.media_type }
    pub fn bytes(&self) -> &[u8] { &self.bytes }
    pub fn len(&self) -> usize { self.bytes.len() }
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Extension of the original file name, if it has one.
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && !ext.contains('/'))
    }
}

impl fmt::Debug for ProofOfPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofOfPayment")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
