//! Product catalog
//!
//! Loaded once at start-up and shared read-only (by reference, or behind an
//! `Arc` in the order service).

use rust_decimal::Decimal;
use std::collections::HashSet;
use crate::domain::aggregates::{Category, Product};
use crate::domain::value_objects::Money;
use crate::ValidationError;

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Product ids must be unique.
    pub fn new(products: Vec<Product>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        if let Some(dup) = products.iter().find(|p| !seen.insert(p.id())) {
            return Err(ValidationError::InvalidProduct(format!("duplicate product id '{}'", dup.id())));
        }
        Ok(Self { products })
    }

    /// The shop's current range.
    pub fn seeded() -> Result<Self, ValidationError> {
        let products = SEED
            .iter()
            .map(|&(id, name, description, cents, image, category)| {
                Product::new(id, name, description, Money::zar(Decimal::new(cents, 2)), image, category)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(products)
    }

    pub fn list_products(&self) -> &[Product] { &self.products }

    /// Products in `category`, or everything for `None`, in catalog order.
    pub fn filter_by_category(&self, category: Option<Category>) -> Vec<&Product> {
        self.products.iter().filter(|p| category.map_or(true, |c| p.category() == c)).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Product> { self.products.iter().find(|p| p.id() == id) }

    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }
}

type SeedEntry = (&'static str, &'static str, &'static str, i64, &'static str, Category);

const SEED: &[SeedEntry] = &[
    ("h1", "GOAT Premium Hoodie", "Premium streetwear hoodie with gold accents and superior comfort", 39999, "hoodie-1.jpeg", Category::Hoodies),
    ("h2", "GOAT LAVA Hoodie", "Lava streetwear hoodie with remix accents and superior comfort", 44999, "hoodie-2.jpeg", Category::Hoodies),
    ("h3", "GOAT 117 Hoodie", "117 streetwear hoodie", 49999, "hoodie-3.jpeg", Category::Hoodies),
    ("h4", "GOAT Mythical Hoodie", "Mythical streetwear hoodie with superior comfort", 89999, "hoodie-4.jpeg", Category::Hoodies),
    ("c1", "GOAT Signature Cap", "Stylish snapback cap with embroidered logo", 29999, "cap-1.jpeg", Category::Caps),
    ("c2", "GOAT Classic Cap", "Classic design cap with premium materials", 24999, "cap-2.jpeg", Category::Caps),
    ("c3", "GOAT Street Cap", "Urban style cap for everyday wear", 19999, "cap-3.jpeg", Category::Caps),
    ("c4", "GOAT Elite Cap", "Elite edition cap with special features", 34999, "cap-4.jpeg", Category::Caps),
    ("c5", "GOAT Limited Cap", "Limited edition cap - exclusive design", 39999, "cap-5.jpeg", Category::Caps),
    ("t1", "GOAT Essential Tee", "Premium cotton t-shirt with minimalist design", 39999, "tshirt-1.jpeg", Category::TShirts),
    ("t2", "GOAT Graphic Tee", "Bold graphic design on premium cotton", 34999, "tshirt-2.jpeg", Category::TShirts),
    ("t3", "GOAT Classic Tee", "Classic fit t-shirt with logo print", 29999, "tshirt-3.jpeg", Category::TShirts),
    ("j1", "GOAT Urban Jacket", "Weatherproof jacket for the modern urban lifestyle", 129999, "jacket.jpeg", Category::Jackets),
    ("a1", "GOAT Gold Chain", "Premium gold-plated chain accessory", 59999, "as-1.jpeg", Category::Accessories),
    ("a2", "GOAT Silver Ring", "Sterling silver ring with GOAT logo", 39999, "as-2.jpeg", Category::Accessories),
    ("combo1", "GOAT Style Combo", "Complete outfit bundle: Hoodie + Cap + Tee", 139999, "combo-1.jpeg", Category::Combo),
    ("combo2", "GOAT Street Combo", "Street style bundle: Jacket + Cap + Accessories", 169999, "combo-2.jpeg", Category::Combo),
    ("combo3", "GOAT Premium Combo", "Premium bundle: All essentials included", 219999, "combo-3.jpeg", Category::Combo),
];
