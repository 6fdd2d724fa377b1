//! Account management: admin listing, profile edits, deletion and the
//! public vendor directory.
//!
//! Deleting an account removes its cart. Its orders stay, and products it
//! sold lose their vendor.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::api_types::{AccountListQuery, UpdateAccountRequest, VendorListQuery, VendorProfile};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use meridian_core::validation::{validate_full_name, validate_username};
use meridian_core::{
    authorize, Account, AccountProfile, Action, AuthContext, Page, PageRequest, Pagination, Role,
    ValidationErrors,
};

pub const ACCOUNTS_PAGE_SIZE: i64 = 20;

pub struct AccountService {
    state: Arc<AppState>,
}

impl AccountService {
    pub fn new(state: Arc<AppState>) -> Self {
        AccountService { state }
    }

    /// Admin listing, optionally filtered by `role`.
    pub async fn list_accounts(&self, auth: &AuthContext, query: AccountListQuery) -> ApiResult<Page<Account>> {
        authorize(auth, Action::ListAccounts)?;

        let role = match query.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(r) => Some(Role::from_str(r)?),
        };
        let page = PageRequest::new(query.page, query.limit, ACCOUNTS_PAGE_SIZE);

        let (items, total) = self.state.db.accounts().list(role, page).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(total, page.page, page.limit),
        })
    }

    pub async fn get_account(&self, auth: &AuthContext, id: &str) -> ApiResult<Account> {
        authorize(auth, Action::ViewAccount { account_id: id })?;
        self.load(id).await
    }

    /// Changes username, full name and a vendor's store name. Role, email
    /// and admin level cannot be changed here.
    pub async fn update_account(&self, auth: &AuthContext, id: &str, req: UpdateAccountRequest) -> ApiResult<Account> {
        let mut account = self.load_for_management(auth, id).await?;

        let mut errors = ValidationErrors::new();
        if let Some(username) = &req.username {
            errors.check(validate_username(username));
        }
        if let Some(full_name) = &req.full_name {
            errors.check(validate_full_name(full_name));
        }
        errors.into_result()?;

        if let Some(username) = req.username {
            account.username = username.trim().to_string();
        }
        if let Some(full_name) = req.full_name {
            account.full_name = full_name.trim().to_string();
        }
        if let (AccountProfile::Vendor { store_name }, Some(new_name)) = (&mut account.profile, req.store_name) {
            let trimmed = new_name.trim();
            *store_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }

        self.state.db.accounts().update_profile(&account, Utc::now()).await?;

        info!(account_id = %id, by = %auth.user_id, "Account updated");
        Ok(account)
    }

    pub async fn delete_account(&self, auth: &AuthContext, id: &str) -> ApiResult<()> {
        self.load_for_management(auth, id).await?;
        self.state.db.accounts().delete(id).await?;

        info!(account_id = %id, by = %auth.user_id, "Account deleted");
        Ok(())
    }

    /// Public vendor directory.
    pub async fn list_vendors(&self, query: VendorListQuery) -> ApiResult<Page<VendorProfile>> {
        let page = PageRequest::new(query.page, query.limit, ACCOUNTS_PAGE_SIZE);
        let (accounts, total) = self.state.db.accounts().list(Some(Role::Vendor), page).await?;

        Ok(Page {
            items: accounts.into_iter().filter_map(VendorProfile::from_account).collect(),
            pagination: Pagination::new(total, page.page, page.limit),
        })
    }

    pub async fn get_vendor(&self, id: &str) -> ApiResult<VendorProfile> {
        self.state
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .and_then(VendorProfile::from_account)
            .ok_or_else(|| ApiError::not_found("Vendor", id))
    }

    async fn load(&self, id: &str) -> ApiResult<Account> {
        self.state
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Account", id))
    }

    /// Loads `id` if the caller may update or delete it. Callers that could
    /// not even view the account get 403 before the lookup.
    async fn load_for_management(&self, auth: &AuthContext, id: &str) -> ApiResult<Account> {
        authorize(auth, Action::ViewAccount { account_id: id })?;
        let target = self.load(id).await?;

        let super_admin = if auth.is_admin() && target.role() == Role::Admin && auth.user_id != id {
            self.load(&auth.user_id).await?.is_super_admin()
        } else {
            false
        };

        authorize(
            auth,
            Action::ManageAccount {
                account_id: id,
                target_role: target.role(),
                super_admin,
            },
        )?;
        Ok(target)
    }
}
