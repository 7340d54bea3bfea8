//! Cart Aggregate
//!
//! A cart lives in the caller's session, so it is persisted as one opaque
//! payload. Lines are keyed by item id and keep insertion order.

use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{ItemId, Money, Quantity};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.unit_price.times(self.quantity) }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Decodes a session payload. Missing or unreadable payloads yield an empty cart.
    pub fn decode(payload: Option<&[u8]>) -> Self {
        let Some(bytes) = payload else { return Self::new() };
        match serde_json::from_slice(bytes) {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable cart payload");
                Self::new()
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> { serde_json::to_vec(self) }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn total(&self) -> Money { self.lines.iter().map(CartLine::line_total).sum() }

    pub fn quantity_of(&self, item_id: ItemId) -> Option<Quantity> {
        self.lines.iter().find(|l| l.item_id == item_id).map(|l| l.quantity)
    }

    /// Merges into an existing line for the same item; the first price snapshot wins.
    pub fn add_item(&mut self, line: CartLine) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.item_id == line.item_id) {
            existing.quantity = existing.quantity.add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }

    /// Returns whether anything changed. Unknown items and quantities below one are ignored.
    pub fn set_quantity(&mut self, item_id: ItemId, quantity: i64) -> bool {
        let Ok(quantity) = Quantity::new(quantity) else { return false };
        match self.lines.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) if line.quantity != quantity => { line.quantity = quantity; true }
            _ => false,
        }
    }

    pub fn remove_item(&mut self, item_id: ItemId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) { self.lines.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(item_id: ItemId, qty: i64, price: i64) -> CartLine {
        CartLine {
            item_id, name: format!("item {price}"), quantity: Quantity::new(qty).unwrap(),
            unit_price: Money::new(Decimal::new(price, 0)).unwrap(),
        }
    }

    #[test]
    fn test_cart_operations() {
        let p1 = ItemId::generate();
        let mut cart = Cart::new();
        cart.add_item(line(p1, 2, 10));
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total().amount(), Decimal::new(20, 0));
        cart.add_item(line(p1, 1, 10));
        assert_eq!(cart.lines()[0].quantity.value(), 3); // Merged
    }

    #[test]
    fn test_add_accumulates_in_any_order() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        let mut left = Cart::new();
        let mut right = Cart::new();
        for q in [1, 4, 2] { left.add_item(line(a, q, 3)); }
        for q in [2, 4, 1] { right.add_item(line(a, q, 3)); }
        left.add_item(line(b, 1, 5));
        assert_eq!(left.quantity_of(a), right.quantity_of(a));
        assert_eq!(left.quantity_of(a).unwrap().value(), 7);
    }

    #[test]
    fn test_merge_keeps_first_price() {
        let a = ItemId::generate();
        let mut cart = Cart::new();
        cart.add_item(line(a, 1, 10));
        cart.add_item(line(a, 1, 12));
        assert_eq!(cart.lines()[0].unit_price.amount(), Decimal::new(10, 0));
    }

    #[test]
    fn test_set_quantity_ignores_invalid() {
        let a = ItemId::generate();
        let mut cart = Cart::new();
        cart.add_item(line(a, 2, 1));
        assert!(!cart.set_quantity(a, 0));
        assert!(!cart.set_quantity(a, -5));
        assert!(!cart.set_quantity(ItemId::generate(), 3));
        assert_eq!(cart.quantity_of(a).unwrap().value(), 2);
        assert!(cart.set_quantity(a, 6));
        assert_eq!(cart.quantity_of(a).unwrap().value(), 6);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let a = ItemId::generate();
        let mut cart = Cart::new();
        cart.add_item(line(a, 1, 1));
        assert!(cart.remove_item(a));
        assert!(!cart.remove_item(a));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decode_fails_open() {
        assert!(Cart::decode(None).is_empty());
        assert!(Cart::decode(Some(b"{not json")).is_empty());
        assert!(Cart::decode(Some(b"[{\"item_id\": 3}]")).is_empty());
    }

    #[test]
    fn test_payload_round_trip() {
        let mut cart = Cart::new();
        cart.add_item(line(ItemId::generate(), 2, 7));
        let bytes = cart.encode().unwrap();
        assert_eq!(Cart::decode(Some(&bytes)), cart);
    }
}
