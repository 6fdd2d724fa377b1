//! # Account Repository
//!
//! Storage for the `Account` tagged union. All roles share one table;
//! the role column picks which payload columns are meaningful.
//!
//! ```text
//! accounts row                          Account
//! ─────────────                         ───────
//! role = 'user'   + address_* ───────►  AccountProfile::User { default_address }
//! role = 'vendor' + store_name ──────►  AccountProfile::Vendor { store_name }
//! role = 'admin'  + admin_level ─────►  AccountProfile::Admin { level }
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use meridian_core::{Account, AccountProfile, Address, AdminLevel, PageRequest, Role};

const ACCOUNT_COLUMNS: &str = "id, email, username, full_name, password_hash, role, admin_level, \
     store_name, address_line1, address_line2, address_city, address_country, address_region, \
     created_at";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: String,
    email: String,
    username: String,
    full_name: String,
    password_hash: String,
    role: Role,
    admin_level: Option<AdminLevel>,
    store_name: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    address_city: Option<String>,
    address_country: Option<String>,
    address_region: Option<String>,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn default_address(&self) -> Option<Address> {
        Some(Address {
            line1: self.address_line1.clone()?,
            line2: self.address_line2.clone(),
            city: self.address_city.clone()?,
            country: self.address_country.clone()?,
            region: self.address_region.clone()?,
        })
    }

    fn into_parts(self) -> (Account, String) {
        let profile = match self.role {
            Role::User => AccountProfile::User {
                default_address: self.default_address(),
            },
            Role::Vendor => AccountProfile::Vendor {
                store_name: self.store_name.clone(),
            },
            Role::Admin => AccountProfile::Admin {
                level: self.admin_level.unwrap_or_default(),
            },
        };

        let account = Account {
            id: self.id,
            email: self.email,
            username: self.username,
            full_name: self.full_name,
            profile,
            created_at: self.created_at,
        };
        (account, self.password_hash)
    }
}

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Inserts an account with its password hash.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email or username taken
    pub async fn insert(&self, account: &Account, password_hash: &str) -> DbResult<()> {
        debug!(id = %account.id, role = %account.role(), "Inserting account");

        let (admin_level, store_name, address) = match &account.profile {
            AccountProfile::User { default_address } => (None, None, default_address.clone()),
            AccountProfile::Vendor { store_name } => (None, store_name.clone(), None),
            AccountProfile::Admin { level } => (Some(*level), None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, username, full_name, password_hash, role, admin_level, store_name,
                address_line1, address_line2, address_city, address_country, address_region,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.full_name)
        .bind(password_hash)
        .bind(account.role())
        .bind(admin_level)
        .bind(store_name)
        .bind(address.as_ref().map(|a| a.line1.clone()))
        .bind(address.as_ref().and_then(|a| a.line2.clone()))
        .bind(address.as_ref().map(|a| a.city.clone()))
        .bind(address.as_ref().map(|a| a.country.clone()))
        .bind(address.as_ref().map(|a| a.region.clone()))
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("accounts.email") => {
                DbError::duplicate("email", &account.email)
            }
            err if err.is_unique_violation_on("accounts.username") => {
                DbError::duplicate("username", &account.username)
            }
            err => err,
        })?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_parts().0))
    }

    /// Looks up an account and its password hash by email (case-insensitive).
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<(Account, String)>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AccountRow::into_parts))
    }

    /// Replaces the default shipping address of a user account.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no user-role account with that id
    pub async fn update_default_address(
        &self,
        user_id: &str,
        address: &Address,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(user_id = %user_id, "Updating default address");

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                address_line1 = ?2,
                address_line2 = ?3,
                address_city = ?4,
                address_country = ?5,
                address_region = ?6,
                updated_at = ?7
            WHERE id = ?1 AND role = 'user'
            "#,
        )
        .bind(user_id)
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.city)
        .bind(&address.country)
        .bind(&address.region)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", user_id));
        }

        Ok(())
    }

    /// Lists accounts oldest first, optionally only one role.
    ///
    /// ## Returns
    /// The page of accounts and the total number of matches.
    pub async fn list(&self, role: Option<Role>, page: PageRequest) -> DbResult<(Vec<Account>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM accounts");
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts"));
        if let Some(role) = role {
            count_qb.push(" WHERE role = ").push_bind(role);
            qb.push(" WHERE role = ").push_bind(role);
        }

        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        qb.push(" ORDER BY created_at, id");
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset());
        let accounts = qb
            .build_query_as::<AccountRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_parts().0)
            .collect::<Vec<_>>();

        debug!(role = ?role, total = total, returned = accounts.len(), "Listed accounts");
        Ok((accounts, total))
    }

    /// Writes `username`, `full_name` and, for vendors, `store_name`.
    /// Role, admin level, email and address are not touched.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no account with that id
    /// * `Err(DbError::UniqueViolation)` - username taken
    pub async fn update_profile(&self, account: &Account, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %account.id, "Updating account profile");

        let store_name = match &account.profile {
            AccountProfile::Vendor { store_name } => store_name.clone(),
            _ => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                username = ?2,
                full_name = ?3,
                store_name = CASE WHEN role = 'vendor' THEN ?4 ELSE store_name END,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.full_name)
        .bind(store_name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            err if err.is_unique_violation_on("accounts.username") => {
                DbError::duplicate("username", &account.username)
            }
            err => err,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", &account.id));
        }

        Ok(())
    }

    /// Deletes an account. Its cart goes with it; its orders stay.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no account with that id
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        debug!(id = %id, "Account deleted");
        Ok(())
    }

    pub async fn count_by_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = ?1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, test_db, unpaid_order, user_account};

    #[tokio::test]
    async fn test_insert_and_read_back_each_role() {
        let db = test_db().await;

        let user = user_account("ada");
        db.accounts().insert(&user, "hash-1").await.unwrap();

        let mut vendor = user_account("lampco");
        vendor.profile = AccountProfile::Vendor {
            store_name: Some("LampCo".to_string()),
        };
        db.accounts().insert(&vendor, "hash-2").await.unwrap();

        let mut admin = user_account("root");
        admin.profile = AccountProfile::Admin {
            level: AdminLevel::Super,
        };
        db.accounts().insert(&admin, "hash-3").await.unwrap();

        assert_eq!(db.accounts().get_by_id(&user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(db.accounts().get_by_id(&vendor.id).await.unwrap(), Some(vendor));
        assert_eq!(db.accounts().get_by_id(&admin.id).await.unwrap(), Some(admin));
        assert_eq!(db.accounts().count_by_role(Role::Admin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_credentials_is_case_insensitive() {
        let db = test_db().await;
        let user = user_account("ada");
        db.accounts().insert(&user, "the-hash").await.unwrap();

        let (found, hash) = db
            .accounts()
            .find_credentials(&user.email.to_uppercase())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "the-hash");
        assert!(db.accounts().find_credentials("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = test_db().await;
        let user = user_account("ada");
        db.accounts().insert(&user, "h").await.unwrap();

        let mut clash = user_account("ada2");
        clash.email = user.email.clone();
        let err = db.accounts().insert(&clash, "h").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_update_default_address() {
        let db = test_db().await;
        let user = user_account("ada");
        db.accounts().insert(&user, "h").await.unwrap();

        let address = Address {
            line1: "9 Marina".to_string(),
            line2: None,
            city: "Lagos".to_string(),
            country: "Nigeria".to_string(),
            region: "Lagos".to_string(),
        };
        db.accounts()
            .update_default_address(&user.id, &address, Utc::now())
            .await
            .unwrap();

        let reloaded = db.accounts().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.default_address(), Some(&address));

        assert!(matches!(
            db.accounts().update_default_address("ghost", &address, Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_role_and_pages() {
        let db = test_db().await;
        for name in ["ada", "bo", "cy"] {
            db.accounts().insert(&user_account(name), "h").await.unwrap();
        }
        let mut vendor = user_account("lampco");
        vendor.profile = AccountProfile::Vendor { store_name: None };
        db.accounts().insert(&vendor, "h").await.unwrap();

        let (all, total) = db
            .accounts()
            .list(None, PageRequest::new(None, None, 20))
            .await
            .unwrap();
        assert_eq!(total, 4);
        assert_eq!(all.len(), 4);

        let (users, total) = db
            .accounts()
            .list(Some(Role::User), PageRequest::new(Some(2), Some(2), 20))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(users.len(), 1);

        let (vendors, _) = db
            .accounts()
            .list(Some(Role::Vendor), PageRequest::new(None, None, 20))
            .await
            .unwrap();
        assert_eq!(vendors, vec![vendor]);
    }

    #[tokio::test]
    async fn test_update_profile_keeps_role_and_email() {
        let db = test_db().await;
        let mut vendor = user_account("lampco");
        vendor.profile = AccountProfile::Vendor { store_name: None };
        db.accounts().insert(&vendor, "h").await.unwrap();
        let taken = user_account("ada");
        db.accounts().insert(&taken, "h").await.unwrap();

        vendor.username = "lamps".to_string();
        vendor.full_name = "Lamp Co".to_string();
        vendor.profile = AccountProfile::Vendor {
            store_name: Some("LampCo".to_string()),
        };
        db.accounts().update_profile(&vendor, Utc::now()).await.unwrap();
        assert_eq!(db.accounts().get_by_id(&vendor.id).await.unwrap(), Some(vendor.clone()));

        vendor.username = "ada".to_string();
        let err = db.accounts().update_profile(&vendor, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));

        let ghost = user_account("ghost");
        assert!(matches!(
            db.accounts().update_profile(&ghost, Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_cart_and_keeps_orders() {
        let db = test_db().await;
        let user = user_account("ada");
        db.accounts().insert(&user, "h").await.unwrap();
        let lamp = product("Lamp", 2500, 3);
        db.products().insert(&lamp).await.unwrap();

        let mut cart = db.carts().get_or_create(&user.id, Utc::now()).await.unwrap();
        cart.add_line(&lamp.id, 1).unwrap();
        db.carts().save(&cart).await.unwrap();
        let order = unpaid_order(&user.id, &[(&lamp, 1)]);
        db.orders().insert(&order).await.unwrap();

        db.accounts().delete(&user.id).await.unwrap();

        assert!(db.accounts().get_by_id(&user.id).await.unwrap().is_none());
        let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts WHERE user_id = ?1")
            .bind(&user.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(carts, 0);
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_lines WHERE cart_id = ?1")
            .bind(&cart.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);
        assert!(db.orders().get_by_id(&order.id).await.unwrap().is_some());

        assert!(matches!(db.accounts().delete(&user.id).await, Err(DbError::NotFound { .. })));
    }
}
