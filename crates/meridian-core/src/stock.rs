//! # Stock Validator
//!
//! Checks checkout lines against the product records read for them and
//! freezes each line's title and price.
//!
//! ```text
//! lines ──► merge_lines() ──► for each line (in order):
//!                               product missing?      → ProductNotFound   (stop)
//!                               stock < quantity?     → InsufficientStock (stop)
//!                               else                  → OrderLine snapshot
//! ```
//!
//! Validation stops at the first violation and runs before anything is
//! written.

use std::collections::HashMap;

use crate::cart::CartLine;
use crate::error::{CoreError, CoreResult};
use crate::types::{OrderLine, Product};

/// Folds duplicate product lines into one, keeping first-seen order.
pub fn merge_lines(lines: &[CartLine]) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }
    merged
}

/// Validates `lines` against `products` (keyed by id) and returns the
/// priced snapshot lines in the same order.
pub fn validate(lines: &[CartLine], products: &HashMap<String, Product>) -> CoreResult<Vec<OrderLine>> {
    merge_lines(lines)
        .into_iter()
        .map(|line| {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if !product.has_stock_for(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id.clone(),
                    title: product.title.clone(),
                    available: product.count_in_stock,
                    requested: line.quantity,
                });
            }

            Ok(OrderLine {
                product_id: product.id.clone(),
                title: product.title.clone(),
                unit_price_cents: product.price_cents,
                quantity: line.quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            vendor_id: None,
            category_id: None,
            sku: None,
            title: format!("Product {id}"),
            description: None,
            image_url: None,
            price_cents: price,
            count_in_stock: stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    #[test]
    fn test_valid_lines_are_priced_in_order() {
        let products = catalog(vec![product("a", 500, 10), product("b", 120, 3)]);
        let lines = vec![CartLine::new("b", 3), CartLine::new("a", 1)];

        let priced = validate(&lines, &products).unwrap();
        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].product_id, "b");
        assert_eq!(priced[0].unit_price_cents, 120);
        assert_eq!(priced[0].title, "Product b");
        assert_eq!(priced[1].quantity, 1);
    }

    #[test]
    fn test_insufficient_stock() {
        let products = catalog(vec![product("a", 500, 2)]);
        let err = validate(&[CartLine::new("a", 5)], &products).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => {
                assert_eq!(product_id, "a");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_product() {
        let products = catalog(vec![product("a", 500, 2)]);
        let err = validate(&[CartLine::new("ghost", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_stops_at_first_violation() {
        let products = catalog(vec![product("a", 500, 0)]);
        let lines = vec![CartLine::new("a", 1), CartLine::new("ghost", 1)];
        assert!(matches!(
            validate(&lines, &products),
            Err(CoreError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_duplicate_lines_checked_together() {
        let products = catalog(vec![product("a", 500, 3)]);
        let lines = vec![CartLine::new("a", 2), CartLine::new("a", 2)];
        let err = validate(&lines, &products).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 4, .. }));

        let merged = merge_lines(&[CartLine::new("a", 1), CartLine::new("b", 1), CartLine::new("a", 1)]);
        assert_eq!(merged, vec![CartLine::new("a", 2), CartLine::new("b", 1)]);
    }

    #[test]
    fn test_exact_stock_is_enough() {
        let products = catalog(vec![product("a", 500, 5)]);
        assert!(validate(&[CartLine::new("a", 5)], &products).is_ok());
    }
}
