//! # Cart
//!
//! The per-user shopping cart and its mutation rules.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP call                 Cart method             Effect               │
//! │  ─────────                 ───────────             ──────               │
//! │  POST   /cart/items  ────► add_line()      ──────► merge or push line   │
//! │  PUT    /cart/items/x ───► set_quantity()  ──────► qty = n (0 removes)  │
//! │  DELETE /cart/items/x ───► remove_line()   ──────► drop line            │
//! │  DELETE /cart        ────► clear()         ──────► no lines, total 0    │
//! │                                                                         │
//! │  Every mutation is followed by recompute_total() before saving.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` and keep insertion order
//! - `quantity` is in `1..=MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_LINES` lines

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// A product reference and quantity inside a cart or checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A user's active cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub lines: Vec<CartLine>,
    /// Cached Σ price × quantity at current prices.
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            lines: Vec::new(),
            total_price_cents: 0,
            updated_at: now,
        }
    }

    /// Adds `quantity` of a product, merging with an existing line.
    pub fn add_line(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            let merged = line.quantity + quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = merged;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::new(product_id, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(product_id);
        }
        validate_quantity(quantity)?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ItemNotInCart(product_id.to_string())),
        }
    }

    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(CoreError::ItemNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.total_price_cents = 0;
    }

    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Sum of quantities across lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Recomputes the cached total from current unit prices.
    /// Lines whose product has no price (deleted) contribute nothing.
    /// On overflow the cart is left unchanged.
    pub fn recompute_total(&mut self, unit_prices: &HashMap<String, i64>) -> CoreResult<()> {
        let mut total = Money::zero();
        for line in &self.lines {
            let Some(price) = unit_prices.get(&line.product_id) else {
                continue;
            };
            total = Money::from_cents(*price)
                .checked_mul_quantity(line.quantity)
                .and_then(|amount| total.checked_add(amount))
                .ok_or(CoreError::AmountOverflow("cart total"))?;
        }
        self.total_price_cents = total.cents();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new("c1", "u1", Utc::now())
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = cart();
        cart.add_line("p1", 2).unwrap();
        cart.add_line("p2", 1).unwrap();
        cart.add_line("p1", 3).unwrap();

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.quantity_of("p1"), 5);
        assert_eq!(cart.lines[0].product_id, "p1");
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_add_rejects_bad_quantities() {
        let mut cart = cart();
        assert!(matches!(cart.add_line("p1", 0), Err(CoreError::Validation(_))));

        cart.add_line("p1", MAX_ITEM_QUANTITY).unwrap();
        assert!(matches!(
            cart.add_line("p1", 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(cart.quantity_of("p1"), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_add_caps_line_count() {
        let mut cart = cart();
        for i in 0..MAX_CART_LINES {
            cart.add_line(&format!("p{i}"), 1).unwrap();
        }
        assert!(matches!(
            cart.add_line("one-more", 1),
            Err(CoreError::CartTooLarge { .. })
        ));
        // merging into an existing line is still allowed
        cart.add_line("p0", 1).unwrap();
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = cart();
        cart.add_line("p1", 2).unwrap();

        cart.set_quantity("p1", 7).unwrap();
        assert_eq!(cart.quantity_of("p1"), 7);

        cart.set_quantity("p1", 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.set_quantity("missing", 2),
            Err(CoreError::ItemNotInCart(_))
        ));
        assert!(matches!(
            cart.remove_line("missing"),
            Err(CoreError::ItemNotInCart(_))
        ));
    }

    #[test]
    fn test_recompute_total_and_clear() {
        let mut cart = cart();
        cart.add_line("p1", 2).unwrap();
        cart.add_line("p2", 1).unwrap();
        cart.add_line("gone", 4).unwrap();

        let prices = HashMap::from([("p1".to_string(), 1250), ("p2".to_string(), 99)]);
        cart.recompute_total(&prices).unwrap();
        assert_eq!(cart.total_price_cents, 2599);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price_cents, 0);
    }

    #[test]
    fn test_recompute_total_overflow_keeps_previous_total() {
        let mut cart = cart();
        cart.add_line("p1", 1).unwrap();
        cart.add_line("p2", 999).unwrap();

        let prices = HashMap::from([("p1".to_string(), 500), ("p2".to_string(), 0)]);
        cart.recompute_total(&prices).unwrap();
        assert_eq!(cart.total_price_cents, 500);

        let prices = HashMap::from([("p1".to_string(), 500), ("p2".to_string(), i64::MAX / 500)]);
        assert!(matches!(
            cart.recompute_total(&prices),
            Err(CoreError::AmountOverflow(_))
        ));
        assert_eq!(cart.total_price_cents, 500);
    }
}
