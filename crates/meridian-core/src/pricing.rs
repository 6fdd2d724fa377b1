//! # Pricing Calculator
//!
//! Turns priced order lines, a shipping quote and an optional discount
//! into an order [`Costing`].
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sub_total              = Σ unit_price × quantity                       │
//! │                                 │                                       │
//! │  discount (usable at now?) ─────┤                                       │
//! │    percentage → sub_total × bps / 10000   (half-up)                     │
//! │    fixed      → min(value, sub_total)                                   │
//! │                                 ▼                                       │
//! │  amount_after_discount  = sub_total − discount_amount   (≥ 0)           │
//! │                                 │                                       │
//! │  shipping quote ────────────────┤                                       │
//! │                                 ▼                                       │
//! │  grand_total            = amount_after_discount + shipping_cost         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator never reads the clock; `now` is passed in so a costing
//! can be reproduced exactly from its inputs. Totals that do not fit in
//! `i64` cents fail with [`CoreError::AmountOverflow`].

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, BPS_SCALE};
use crate::shipping::ShippingQuote;
use crate::types::{Costing, Discount, DiscountKind, OrderLine};

/// Sum of `unit_price × quantity` over all lines.
pub fn sub_total(lines: &[OrderLine]) -> CoreResult<Money> {
    let mut total = Money::zero();
    for line in lines {
        total = line
            .line_total()
            .and_then(|amount| total.checked_add(amount))
            .ok_or(CoreError::AmountOverflow("sub_total"))?;
    }
    Ok(total)
}

/// Amount a discount takes off `sub_total`. Always within `0..=sub_total`.
pub fn discount_amount(discount: &Discount, sub_total: Money) -> Money {
    if sub_total.cents() <= 0 {
        return Money::zero();
    }

    match discount.kind {
        DiscountKind::Percentage => sub_total.percentage(discount.value.clamp(0, BPS_SCALE)),
        DiscountKind::Fixed => Money::from_cents(discount.value.clamp(0, sub_total.cents())),
    }
}

/// Computes the costing for an order.
///
/// A discount that is not usable at `now` is ignored and
/// `discount_applied` is false.
pub fn calculate(
    lines: &[OrderLine],
    shipping: &ShippingQuote,
    discount: Option<&Discount>,
    now: DateTime<Utc>,
) -> CoreResult<Costing> {
    let sub_total = sub_total(lines)?;

    let usable = discount.filter(|d| d.is_usable_at(now));
    let discount_amount = usable
        .map(|d| discount_amount(d, sub_total))
        .unwrap_or_default();

    let amount_after_discount = sub_total.saturating_sub_floor(discount_amount);
    let shipping_cost = shipping.rate();
    let grand_total = amount_after_discount
        .checked_add(shipping_cost)
        .ok_or(CoreError::AmountOverflow("grand_total"))?;

    Ok(Costing {
        sub_total_cents: sub_total.cents(),
        discount_amount_cents: discount_amount.cents(),
        amount_after_discount_cents: amount_after_discount.cents(),
        shipping_cost_cents: shipping_cost.cents(),
        grand_total_cents: grand_total.cents(),
        discount_applied: usable.is_some() && discount_amount.cents() > 0,
        promocode: usable
            .filter(|_| discount_amount.cents() > 0)
            .map(|d| d.promocode.clone()),
        shipping_id: shipping.shipping_id.clone(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::DEFAULT_SHIPPING_RATE_CENTS;
    use chrono::Duration;

    fn line(price: i64, qty: i64) -> OrderLine {
        OrderLine {
            product_id: format!("p-{price}-{qty}"),
            title: "Item".to_string(),
            unit_price_cents: price,
            quantity: qty,
        }
    }

    fn discount(kind: DiscountKind, value: i64, now: DateTime<Utc>) -> Discount {
        Discount {
            id: "d1".to_string(),
            promocode: "SAVE".to_string(),
            kind,
            value,
            is_active: true,
            expires_at: now + Duration::days(7),
            created_at: now,
            updated_at: now,
        }
    }

    fn quote(cents: i64) -> ShippingQuote {
        ShippingQuote {
            rate_cents: cents,
            shipping_id: Some("s1".to_string()),
        }
    }

    #[test]
    fn test_percentage_discount_twenty_of_hundred() {
        let now = Utc::now();
        let d = discount(DiscountKind::Percentage, 2000, now);
        let costing = calculate(&[line(10_000, 1)], &quote(0), Some(&d), now).unwrap();

        assert_eq!(costing.sub_total_cents, 10_000);
        assert_eq!(costing.discount_amount_cents, 2000);
        assert_eq!(costing.amount_after_discount_cents, 8000);
        assert!(costing.discount_applied);
        assert_eq!(costing.promocode.as_deref(), Some("SAVE"));
    }

    #[test]
    fn test_fixed_discount_capped_at_sub_total() {
        let now = Utc::now();
        let d = discount(DiscountKind::Fixed, 5000, now);
        let costing = calculate(&[line(1000, 3)], &quote(1000), Some(&d), now).unwrap();

        assert_eq!(costing.sub_total_cents, 3000);
        assert_eq!(costing.discount_amount_cents, 3000);
        assert_eq!(costing.amount_after_discount_cents, 0);
        assert_eq!(costing.grand_total_cents, 1000);
    }

    #[test]
    fn test_expired_discount_not_applied() {
        let now = Utc::now();
        let mut d = discount(DiscountKind::Percentage, 2000, now);
        d.expires_at = now - Duration::hours(1);

        let costing = calculate(&[line(10_000, 1)], &quote(500), Some(&d), now).unwrap();
        assert!(!costing.discount_applied);
        assert_eq!(costing.discount_amount_cents, 0);
        assert_eq!(costing.amount_after_discount_cents, costing.sub_total_cents);
        assert_eq!(costing.promocode, None);
    }

    #[test]
    fn test_inactive_discount_not_applied() {
        let now = Utc::now();
        let mut d = discount(DiscountKind::Fixed, 100, now);
        d.is_active = false;

        let costing = calculate(&[line(1000, 1)], &quote(0), Some(&d), now).unwrap();
        assert!(!costing.discount_applied);
        assert_eq!(costing.amount_after_discount_cents, 1000);
    }

    #[test]
    fn test_default_shipping_quote_added_to_total() {
        let now = Utc::now();
        let costing = calculate(&[line(2500, 2)], &ShippingQuote::default(), None, now).unwrap();

        assert_eq!(costing.shipping_cost_cents, DEFAULT_SHIPPING_RATE_CENTS);
        assert_eq!(costing.grand_total_cents, 5000 + DEFAULT_SHIPPING_RATE_CENTS);
        assert_eq!(costing.shipping_id, None);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let now = Utc::now();
        // 15% of 9.99 = 1.4985 → 1.50
        let d = discount(DiscountKind::Percentage, 1500, now);
        let costing = calculate(&[line(999, 1)], &quote(0), Some(&d), now).unwrap();
        assert_eq!(costing.discount_amount_cents, 150);
        assert_eq!(costing.amount_after_discount_cents, 849);
    }

    #[test]
    fn test_out_of_range_percentage_is_clamped() {
        let now = Utc::now();
        let d = discount(DiscountKind::Percentage, 25_000, now);
        let costing = calculate(&[line(1000, 1)], &quote(0), Some(&d), now).unwrap();
        assert_eq!(costing.discount_amount_cents, 1000);
        assert_eq!(costing.amount_after_discount_cents, 0);
    }

    #[test]
    fn test_same_inputs_same_costing() {
        let now = Utc::now();
        let d = discount(DiscountKind::Percentage, 1250, now);
        let lines = [line(1999, 3), line(450, 7)];
        let a = calculate(&lines, &quote(799), Some(&d), now).unwrap();
        let b = calculate(&lines, &quote(799), Some(&d), now).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_invariants_hold_across_carts() {
        let now = Utc::now();
        let prices = [0, 1, 99, 1999, 25_000];
        let quantities = [1, 2, 7, 999];
        let discounts = [
            None,
            Some(discount(DiscountKind::Percentage, 1, now)),
            Some(discount(DiscountKind::Percentage, 3333, now)),
            Some(discount(DiscountKind::Percentage, 10_000, now)),
            Some(discount(DiscountKind::Fixed, 0, now)),
            Some(discount(DiscountKind::Fixed, 1500, now)),
            Some(discount(DiscountKind::Fixed, 10_000_000, now)),
        ];

        for price in prices {
            for qty in quantities {
                for d in &discounts {
                    let lines = [line(price, qty), line(price / 2 + 1, 1)];
                    let costing = calculate(&lines, &quote(1000), d.as_ref(), now).unwrap();
                    assert!(costing.is_consistent(), "{costing:?}");
                    assert_eq!(
                        costing.grand_total_cents,
                        costing.amount_after_discount_cents + costing.shipping_cost_cents
                    );
                    assert_eq!(
                        costing.amount_after_discount_cents,
                        costing.sub_total_cents - costing.discount_amount_cents
                    );
                    assert!(costing.discount_amount_cents <= costing.sub_total_cents);
                }
            }
        }
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let now = Utc::now();
        let price = i64::MAX / 500;
        assert!(crate::validation::validate_amount("price_cents", price).is_err());

        let err = calculate(&[line(price, 999)], &ShippingQuote::default(), None, now).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow("sub_total")));
    }

    #[test]
    fn test_sub_total_overflow_across_lines_is_an_error() {
        let lines = [line(i64::MAX / 2, 1), line(i64::MAX / 2, 1), line(10, 1)];
        assert!(matches!(sub_total(&lines), Err(CoreError::AmountOverflow("sub_total"))));
    }

    #[test]
    fn test_grand_total_overflow_is_an_error() {
        let now = Utc::now();
        let err = calculate(&[line(1000, 1)], &quote(i64::MAX), None, now).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow("grand_total")));
    }
}
