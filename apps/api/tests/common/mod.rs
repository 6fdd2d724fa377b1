//! Shared fixtures: an in-memory store with one account per role and a
//! few products, plus bearer tokens for each account.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use meridian_api::{ApiConfig, AppState};
use meridian_core::{
    Account, AccountProfile, Address, AdminLevel, AuthContext, Discount, DiscountKind, Product, ShippingRate,
};
use meridian_db::credentials::hash_password;
use meridian_db::{Database, DbConfig};

pub const PASSWORD: &str = "Passw0rdOk";

pub struct Fixture {
    pub state: Arc<AppState>,
    pub shopper: Account,
    pub other_shopper: Account,
    pub vendor: Account,
    pub admin: Account,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(ApiConfig::default()).await
    }

    pub async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = Arc::new(AppState::new(db, config));

        let shopper = account(
            "shopper",
            AccountProfile::User {
                default_address: Some(address("Egypt", "Cairo")),
            },
        );
        let other_shopper = account("othershopper", AccountProfile::User { default_address: None });
        let vendor = account(
            "lampco",
            AccountProfile::Vendor {
                store_name: Some("LampCo".to_string()),
            },
        );
        let admin = account("root", AccountProfile::Admin { level: AdminLevel::Super });

        let hash = hash_password(PASSWORD).unwrap();
        for acct in [&shopper, &other_shopper, &vendor, &admin] {
            state.db.accounts().insert(acct, &hash).await.unwrap();
        }

        Fixture {
            state,
            shopper,
            other_shopper,
            vendor,
            admin,
        }
    }

    pub fn ctx(account: &Account) -> AuthContext {
        AuthContext::new(account.id.clone(), account.role())
    }

    pub fn token(&self, account: &Account) -> String {
        self.state
            .jwt
            .generate_access_token(&account.id, account.role())
            .unwrap()
    }

    pub async fn add_product(&self, title: &str, price_cents: i64, count_in_stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            vendor_id: Some(self.vendor.id.clone()),
            category_id: None,
            sku: None,
            title: title.to_string(),
            description: None,
            image_url: None,
            price_cents,
            count_in_stock,
            created_at: now,
            updated_at: now,
        };
        self.state.db.products().insert(&product).await.unwrap()
    }

    pub async fn add_discount(&self, code: &str, kind: DiscountKind, value: i64, expires_in: Duration) -> Discount {
        let now = Utc::now();
        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            promocode: code.to_string(),
            kind,
            value,
            is_active: true,
            expires_at: now + expires_in,
            created_at: now,
            updated_at: now,
        };
        self.state.db.discounts().insert(&discount).await.unwrap();
        discount
    }

    pub async fn add_shipping_rate(&self, country: &str, region: &str, rate_cents: i64) -> ShippingRate {
        let rate = ShippingRate {
            id: Uuid::new_v4().to_string(),
            country: country.to_string(),
            region: region.to_string(),
            rate_cents,
            created_at: Utc::now(),
        };
        self.state.db.shipping_rates().insert(&rate).await.unwrap();
        rate
    }

    pub async fn add_account(&self, username: &str, profile: AccountProfile) -> Account {
        let acct = account(username, profile);
        let hash = hash_password(PASSWORD).unwrap();
        self.state.db.accounts().insert(&acct, &hash).await.unwrap();
        acct
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        self.state
            .db
            .products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .count_in_stock
    }

    pub async fn order_count(&self) -> usize {
        let (orders, _) = self
            .state
            .db
            .orders()
            .list(&Default::default(), meridian_core::PageRequest::new(None, Some(100), 100))
            .await
            .unwrap();
        orders.len()
    }
}

pub fn address(country: &str, region: &str) -> Address {
    Address {
        line1: "12 Nile Street".to_string(),
        line2: None,
        city: "Cairo".to_string(),
        country: country.to_string(),
        region: region.to_string(),
    }
}

fn account(username: &str, profile: AccountProfile) -> Account {
    Account {
        id: Uuid::new_v4().to_string(),
        email: format!("{username}@example.com"),
        username: username.to_string(),
        full_name: format!("{username} Tester"),
        profile,
        created_at: Utc::now(),
    }
}
