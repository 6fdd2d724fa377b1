//! # Order Assembly
//!
//! Pure steps of checkout that sit between the lookups:
//!
//! ```text
//! resolve_address ─► check lines non-empty ─► stock::validate
//!        ─► discount::resolve ─► shipping::quote ─► pricing::calculate
//!        ─► new_unpaid_order
//! ```
//!
//! plus the rule for admin status changes.

use chrono::{DateTime, Utc};

use crate::account::Account;
use crate::cart::CartLine;
use crate::error::{CoreError, CoreResult};
use crate::types::{Address, Costing, Order, OrderLine, OrderStatus};

/// Picks the shipping address: the explicit one, else the account default.
pub fn resolve_address(explicit: Option<Address>, account: &Account) -> CoreResult<Address> {
    explicit
        .or_else(|| account.default_address().cloned())
        .ok_or(CoreError::NoAddressAvailable)
}

pub fn ensure_not_empty(lines: &[CartLine]) -> CoreResult<()> {
    if lines.is_empty() {
        Err(CoreError::EmptyCart)
    } else {
        Ok(())
    }
}

/// Builds the order snapshot in `not_paid` state.
pub fn new_unpaid_order(
    id: String,
    user_id: &str,
    address: Address,
    lines: Vec<OrderLine>,
    costing: Costing,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id,
        user_id: user_id.to_string(),
        address,
        lines,
        costing,
        status: OrderStatus::NotPaid,
        payment_details: None,
        created_at: now,
        updated_at: now,
        paid_at: None,
    }
}

/// Admin status changes may go anywhere except back to `not_paid`,
/// which would re-arm payment completion for a paid order.
pub fn check_status_change(order_id: &str, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
    if to == OrderStatus::NotPaid && from != OrderStatus::NotPaid {
        return Err(CoreError::InvalidStatusTransition {
            order_id: order_id.to_string(),
            from,
            to,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountProfile;

    fn address(city: &str) -> Address {
        Address {
            line1: "4 Canal St".to_string(),
            line2: Some("Unit 2".to_string()),
            city: city.to_string(),
            country: "Egypt".to_string(),
            region: "Giza".to_string(),
        }
    }

    fn account(default_address: Option<Address>) -> Account {
        Account {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            username: "u1user".to_string(),
            full_name: "User One".to_string(),
            profile: AccountProfile::User { default_address },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_explicit_address_wins() {
        let resolved = resolve_address(Some(address("Cairo")), &account(Some(address("Giza")))).unwrap();
        assert_eq!(resolved.city, "Cairo");
    }

    #[test]
    fn test_falls_back_to_default_address() {
        let resolved = resolve_address(None, &account(Some(address("Giza")))).unwrap();
        assert_eq!(resolved.city, "Giza");
    }

    #[test]
    fn test_no_address_available() {
        assert!(matches!(
            resolve_address(None, &account(None)),
            Err(CoreError::NoAddressAvailable)
        ));
    }

    #[test]
    fn test_empty_lines_rejected() {
        assert!(matches!(ensure_not_empty(&[]), Err(CoreError::EmptyCart)));
        assert!(ensure_not_empty(&[CartLine::new("p", 1)]).is_ok());
    }

    #[test]
    fn test_new_order_is_unpaid() {
        let now = Utc::now();
        let costing = Costing {
            sub_total_cents: 100,
            discount_amount_cents: 0,
            amount_after_discount_cents: 100,
            shipping_cost_cents: 1000,
            grand_total_cents: 1100,
            discount_applied: false,
            promocode: None,
            shipping_id: None,
        };
        let order = new_unpaid_order("o1".into(), "u1", address("Cairo"), vec![], costing, now);
        assert_eq!(order.status, OrderStatus::NotPaid);
        assert!(order.paid_at.is_none());
        assert!(order.is_owned_by("u1"));
    }

    #[test]
    fn test_status_change_rules() {
        assert!(check_status_change("o1", OrderStatus::Pending, OrderStatus::Shipped).is_ok());
        assert!(check_status_change("o1", OrderStatus::NotPaid, OrderStatus::Cancelled).is_ok());
        assert!(check_status_change("o1", OrderStatus::NotPaid, OrderStatus::NotPaid).is_ok());
        assert!(matches!(
            check_status_change("o1", OrderStatus::Pending, OrderStatus::NotPaid),
            Err(CoreError::InvalidStatusTransition { .. })
        ));
    }
}
