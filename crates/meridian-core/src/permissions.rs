//! # Permissions
//!
//! One explicit check per operation against the caller's role.
//!
//! ## Matrix
//! ```text
//! ┌──────────────────────────────┬───────┬────────────────┬───────┐
//! │ Action                       │ user  │ vendor         │ admin │
//! ├──────────────────────────────┼───────┼────────────────┼───────┤
//! │ cart, create order, pay,     │  ✓    │  ✓             │  ✓    │
//! │ list own orders              │       │                │       │
//! │ view order                   │ owner │ owner          │  ✓    │
//! │ list all orders, set status  │       │                │  ✓    │
//! │ create product               │       │  ✓             │  ✓    │
//! │ update / restock / delete    │       │ own products   │  ✓    │
//! │ categories, discounts,       │       │                │  ✓    │
//! │ shipping rates               │       │                │       │
//! │ set default address          │  ✓    │                │       │
//! │ view account                 │ self  │ self           │  ✓    │
//! │ update / delete account      │ self  │ self           │ ✓ (1) │
//! │ list accounts                │       │                │  ✓    │
//! └──────────────────────────────┴───────┴────────────────┴───────┘
//! ```
//!
//! (1) Another admin's account needs a `super` admin.

use serde::{Deserialize, Serialize};

use crate::account::Role;
use crate::error::{CoreError, CoreResult};

/// Who is making the request. Built from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Operations that need a permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    ManageOwnCart,
    CreateOrder,
    CompletePayment,
    ListOwnOrders,
    ViewOrder { owner_id: &'a str },
    ListAllOrders,
    UpdateOrderStatus,
    CreateProduct,
    /// Update, restock or delete a product listed by `vendor_id`.
    ModifyProduct { vendor_id: Option<&'a str> },
    ManageCategories,
    ManageDiscounts,
    ManageShipping,
    UpdateDefaultAddress,
    ListAccounts,
    ViewAccount { account_id: &'a str },
    /// Update or delete the account `account_id`, whose role is `target_role`.
    /// `super_admin` is whether the caller holds the `super` admin level.
    ManageAccount {
        account_id: &'a str,
        target_role: Role,
        super_admin: bool,
    },
}

/// Returns `Forbidden` unless `ctx` may perform `action`.
pub fn authorize(ctx: &AuthContext, action: Action<'_>) -> CoreResult<()> {
    let allowed = match action {
        Action::ManageOwnCart
        | Action::CreateOrder
        | Action::CompletePayment
        | Action::ListOwnOrders => true,

        Action::ViewOrder { owner_id } => ctx.is_admin() || ctx.user_id == owner_id,

        Action::ListAllOrders
        | Action::UpdateOrderStatus
        | Action::ManageCategories
        | Action::ManageDiscounts
        | Action::ManageShipping => ctx.is_admin(),

        Action::CreateProduct => matches!(ctx.role, Role::Vendor | Role::Admin),

        Action::ModifyProduct { vendor_id } => match ctx.role {
            Role::Admin => true,
            Role::Vendor => vendor_id == Some(ctx.user_id.as_str()),
            Role::User => false,
        },

        Action::UpdateDefaultAddress => ctx.role == Role::User,

        Action::ListAccounts => ctx.is_admin(),

        Action::ViewAccount { account_id } => ctx.is_admin() || ctx.user_id == account_id,

        Action::ManageAccount {
            account_id,
            target_role,
            super_admin,
        } => ctx.user_id == account_id || (ctx.is_admin() && (target_role != Role::Admin || super_admin)),
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthContext {
        AuthContext::new("u1", Role::User)
    }

    fn vendor() -> AuthContext {
        AuthContext::new("v1", Role::Vendor)
    }

    fn admin() -> AuthContext {
        AuthContext::new("a1", Role::Admin)
    }

    #[test]
    fn test_everyone_can_shop() {
        for ctx in [user(), vendor(), admin()] {
            assert!(authorize(&ctx, Action::ManageOwnCart).is_ok());
            assert!(authorize(&ctx, Action::CreateOrder).is_ok());
            assert!(authorize(&ctx, Action::CompletePayment).is_ok());
            assert!(authorize(&ctx, Action::ListOwnOrders).is_ok());
        }
    }

    #[test]
    fn test_view_order_owner_or_admin() {
        assert!(authorize(&user(), Action::ViewOrder { owner_id: "u1" }).is_ok());
        assert!(matches!(
            authorize(&user(), Action::ViewOrder { owner_id: "someone-else" }),
            Err(CoreError::Forbidden)
        ));
        assert!(authorize(&admin(), Action::ViewOrder { owner_id: "u1" }).is_ok());
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [
            Action::ListAllOrders,
            Action::UpdateOrderStatus,
            Action::ManageCategories,
            Action::ManageDiscounts,
            Action::ManageShipping,
            Action::ListAccounts,
        ] {
            assert!(authorize(&admin(), action).is_ok());
            assert!(authorize(&user(), action).is_err());
            assert!(authorize(&vendor(), action).is_err());
        }
    }

    #[test]
    fn test_product_rules() {
        assert!(authorize(&vendor(), Action::CreateProduct).is_ok());
        assert!(authorize(&user(), Action::CreateProduct).is_err());

        let own = Action::ModifyProduct { vendor_id: Some("v1") };
        let other = Action::ModifyProduct { vendor_id: Some("v2") };
        let unowned = Action::ModifyProduct { vendor_id: None };

        assert!(authorize(&vendor(), own).is_ok());
        assert!(authorize(&vendor(), other).is_err());
        assert!(authorize(&vendor(), unowned).is_err());
        assert!(authorize(&admin(), other).is_ok());
        assert!(authorize(&user(), own).is_err());
    }

    #[test]
    fn test_default_address_is_for_users() {
        assert!(authorize(&user(), Action::UpdateDefaultAddress).is_ok());
        assert!(authorize(&vendor(), Action::UpdateDefaultAddress).is_err());
    }

    #[test]
    fn test_account_self_service() {
        let own = Action::ManageAccount {
            account_id: "u1",
            target_role: Role::User,
            super_admin: false,
        };
        let other = Action::ManageAccount {
            account_id: "u2",
            target_role: Role::User,
            super_admin: false,
        };
        assert!(authorize(&user(), own).is_ok());
        assert!(authorize(&user(), other).is_err());
        assert!(authorize(&vendor(), other).is_err());
        assert!(authorize(&admin(), other).is_ok());

        assert!(authorize(&user(), Action::ViewAccount { account_id: "u1" }).is_ok());
        assert!(authorize(&user(), Action::ViewAccount { account_id: "v1" }).is_err());
        assert!(authorize(&admin(), Action::ViewAccount { account_id: "v1" }).is_ok());
    }

    #[test]
    fn test_other_admins_need_super_level() {
        let other_admin = |super_admin| Action::ManageAccount {
            account_id: "a2",
            target_role: Role::Admin,
            super_admin,
        };
        assert!(authorize(&admin(), other_admin(false)).is_err());
        assert!(authorize(&admin(), other_admin(true)).is_ok());

        let own = Action::ManageAccount {
            account_id: "a1",
            target_role: Role::Admin,
            super_admin: false,
        };
        assert!(authorize(&admin(), own).is_ok());
    }
}
