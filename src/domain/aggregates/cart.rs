//! Cart Aggregate

use rust_decimal::Decimal;
use crate::domain::aggregates::product::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Customization, LineId, Money, Quantity};

/// Session cart. Lines keep insertion order; every add creates a new line.
#[derive(Clone, Debug)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: String,
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    id: LineId,
    product: Product,
    quantity: Quantity,
    customization: Option<Customization>,
}

impl CartLine {
    pub fn id(&self) -> LineId { self.id }
    pub fn product(&self) -> &Product { &self.product }
    pub fn quantity(&self) -> Quantity { self.quantity }
    pub fn customization(&self) -> Option<&Customization> { self.customization.as_ref() }
    pub fn line_total(&self) -> Money { self.product.price().multiply(self.quantity.value()) }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self { lines: vec![], currency: currency.to_string(), events: vec![] }
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn line(&self, id: LineId) -> Option<&CartLine> { self.lines.iter().find(|l| l.id == id) }
    pub fn len(&self) -> usize { self.lines.len() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn currency(&self) -> &str { &self.currency }

    pub fn add_item(&mut self, product: &Product, customization: Option<Customization>) -> &CartLine {
        let line = CartLine {
            id: LineId::new(),
            product: product.clone(),
            quantity: Quantity::ONE,
            customization: customization.map(|c| fit_to(product, c)).and_then(Customization::non_empty),
        };
        tracing::debug!(line_id = %line.id, product_id = product.id(), "cart line added");
        self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { line_id: line.id, product_name: product.name().to_string() }));
        self.lines.push(line);
        &self.lines[self.lines.len() - 1]
    }

    /// Zero removes the line. Unknown ids are ignored.
    pub fn set_quantity(&mut self, id: LineId, quantity: u32) {
        let Some(quantity) = Quantity::new(quantity) else {
            self.remove_item(id);
            return;
        };
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn remove_item(&mut self, id: LineId) {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        if self.lines.len() != before {
            self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { line_id: id }));
        }
    }

    pub fn total(&self) -> Money {
        self.lines.iter().fold(Money::zero(&self.currency), |acc, l| acc.add(&l.line_total()).unwrap_or(acc))
    }

    /// Units across all lines, for the cart badge.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.value())).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.raise_event(DomainEvent::Cart(CartEvent::Cleared));
    }

    pub fn total_amount(&self) -> Decimal { self.total().amount() }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

impl Default for Cart { fn default() -> Self { Self::new("ZAR") } }

/// Sizes only apply to garments that come in sizes.
fn fit_to(product: &Product, mut customization: Customization) -> Customization {
    if !product.category().offers_sizes() {
        customization.size = None;
    }
    customization
}
