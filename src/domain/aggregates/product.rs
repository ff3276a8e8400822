//! Product Aggregate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use rust_decimal::Decimal;
use crate::domain::value_objects::Money;
use crate::ValidationError;

/// Upper bound on a unit price, so cart totals stay well inside `Decimal`.
pub const MAX_PRICE: i64 = 1_000_000_000;

/// Catalog entry. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: String,
    name: String,
    description: String,
    price: Money,
    image: String,
    category: Category,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Caps,
    Accessories,
    Hoodies,
    #[serde(rename = "T-shirts")]
    TShirts,
    Jackets,
    Combo,
}

impl Category {
    /// Display order of the category filter.
    pub const ALL: [Category; 6] = [
        Category::Caps, Category::Accessories, Category::Hoodies,
        Category::TShirts, Category::Jackets, Category::Combo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Caps => "Caps",
            Self::Accessories => "Accessories",
            Self::Hoodies => "Hoodies",
            Self::TShirts => "T-shirts",
            Self::Jackets => "Jackets",
            Self::Combo => "Combo",
        }
    }

    /// Clothing comes in sizes; every category can be ordered in a colour.
    pub fn offers_sizes(&self) -> bool {
        matches!(self, Self::Hoodies | Self::Jackets | Self::TShirts)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Category {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidProduct(format!("unknown category '{}'", s)))
    }
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        image: impl Into<String>,
        category: Category,
    ) -> Result<Self, ValidationError> {
        let (id, name) = (id.into(), name.into());
        if id.trim().is_empty() { return Err(ValidationError::InvalidProduct("missing id".into())); }
        if name.trim().is_empty() { return Err(ValidationError::InvalidProduct(format!("{}: missing name", id))); }
        if price.is_negative() { return Err(ValidationError::InvalidProduct(format!("{}: negative price", id))); }
        if price.amount() > Decimal::from(MAX_PRICE) {
            return Err(ValidationError::InvalidProduct(format!("{}: price above {}", id, MAX_PRICE)));
        }
        Ok(Self { id, name, description: description.into(), price, image: image.into(), category })
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> &Money { &self.price }
    pub fn image(&self) -> &str { &self.image }
    pub fn category(&self) -> Category { self.category }
}
