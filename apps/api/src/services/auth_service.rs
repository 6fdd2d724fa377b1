//! Authentication service implementation.
//!
//! Registration, password login and token refresh. Passwords are stored as
//! argon2 hashes; sessions are stateless JWT pairs.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api_types::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use meridian_core::validation::{
    validate_address, validate_email, validate_full_name, validate_password, validate_username,
};
use meridian_core::{
    authorize, Account, AccountProfile, Action, Address, AuthContext, Role, ValidationError, ValidationErrors,
};
use meridian_db::credentials::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Authentication service.
pub struct AuthService {
    state: Arc<AppState>,
}

impl AuthService {
    pub fn new(state: Arc<AppState>) -> Self {
        AuthService { state }
    }

    /// Creates a `user` or `vendor` account and signs it in.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<AuthResponse> {
        let role = req.role.unwrap_or(Role::User);

        let mut errors = ValidationErrors::new();
        errors.check(validate_email(&req.email));
        errors.check(validate_username(&req.username));
        errors.check(validate_password(&req.password));
        errors.check(validate_full_name(&req.full_name));
        if role == Role::Admin {
            errors.push(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![Role::User.to_string(), Role::Vendor.to_string()],
            });
        }
        errors.into_result()?;

        let profile = match role {
            Role::Vendor => AccountProfile::Vendor {
                store_name: req
                    .store_name
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            },
            _ => AccountProfile::User { default_address: None },
        };

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: req.email.trim().to_lowercase(),
            username: req.username.trim().to_string(),
            full_name: req.full_name.trim().to_string(),
            profile,
            created_at: Utc::now(),
        };

        let hash = hash_password(&req.password)?;
        self.state.db.accounts().insert(&account, &hash).await?;

        info!(account_id = %account.id, role = %role, "Account registered");

        let tokens = self.issue_tokens(&account.id, role)?;
        Ok(AuthResponse { account, tokens })
    }

    /// Exchanges email and password for a token pair.
    pub async fn login(&self, req: LoginRequest) -> ApiResult<AuthResponse> {
        let found = self.state.db.accounts().find_credentials(&req.email).await?;

        let Some((account, hash)) = found else {
            warn!("Login attempt for unknown email");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&req.password, &hash) {
            warn!(account_id = %account.id, "Login attempt with wrong password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        info!(account_id = %account.id, role = %account.role(), "Login successful");

        let tokens = self.issue_tokens(&account.id, account.role())?;
        Ok(AuthResponse { account, tokens })
    }

    /// Issues a fresh pair from a refresh token. The role is re-read from
    /// the account so it never outlives a change.
    pub async fn refresh(&self, req: RefreshRequest) -> ApiResult<TokenPair> {
        let claims = self.state.jwt.validate_refresh_token(&req.refresh_token)?;

        let account = self
            .state
            .db
            .accounts()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

        info!(account_id = %account.id, "Token refreshed");
        self.issue_tokens(&account.id, account.role())
    }

    pub async fn me(&self, auth: &AuthContext) -> ApiResult<Account> {
        self.state
            .db
            .accounts()
            .get_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))
    }

    /// Replaces the caller's default shipping address. Only shoppers have one.
    pub async fn update_default_address(&self, auth: &AuthContext, address: Address) -> ApiResult<Account> {
        authorize(auth, Action::UpdateDefaultAddress)?;
        validate_address(&address)?;

        self.state
            .db
            .accounts()
            .update_default_address(&auth.user_id, &address, Utc::now())
            .await?;

        self.me(auth).await
    }

    fn issue_tokens(&self, account_id: &str, role: Role) -> ApiResult<TokenPair> {
        let jwt = &self.state.jwt;
        Ok(TokenPair {
            access_token: jwt.generate_access_token(account_id, role)?,
            refresh_token: jwt.generate_refresh_token(account_id, role)?,
            token_type: "Bearer".to_string(),
            expires_in: jwt.access_lifetime_secs(),
        })
    }
}
