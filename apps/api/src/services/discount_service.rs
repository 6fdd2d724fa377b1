//! Promocode administration. Checkout only ever reads discounts.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::api_types::DiscountRequest;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use meridian_core::validation::{validate_amount, validate_percentage_bps, validate_promocode};
use meridian_core::{authorize, Action, AuthContext, Discount, DiscountKind, ValidationErrors};

pub struct DiscountService {
    state: Arc<AppState>,
}

impl DiscountService {
    pub fn new(state: Arc<AppState>) -> Self {
        DiscountService { state }
    }

    pub async fn list(&self, auth: &AuthContext) -> ApiResult<Vec<Discount>> {
        authorize(auth, Action::ManageDiscounts)?;
        Ok(self.state.db.discounts().list().await?)
    }

    pub async fn get(&self, auth: &AuthContext, id: &str) -> ApiResult<Discount> {
        authorize(auth, Action::ManageDiscounts)?;
        self.find(id).await
    }

    /// ## Returns
    /// * `Err(Conflict)` - the promocode is taken
    pub async fn create(&self, auth: &AuthContext, req: DiscountRequest) -> ApiResult<Discount> {
        authorize(auth, Action::ManageDiscounts)?;
        validate_request(&req)?;

        let now = Utc::now();
        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            promocode: req.promocode.trim().to_string(),
            kind: req.kind,
            value: req.value,
            is_active: req.is_active,
            expires_at: req.expires_at,
            created_at: now,
            updated_at: now,
        };

        self.state.db.discounts().insert(&discount).await?;
        info!(discount_id = %discount.id, promocode = %discount.promocode, "Discount created");

        Ok(discount)
    }

    pub async fn update(&self, auth: &AuthContext, id: &str, req: DiscountRequest) -> ApiResult<Discount> {
        authorize(auth, Action::ManageDiscounts)?;
        validate_request(&req)?;

        let mut discount = self.find(id).await?;
        discount.promocode = req.promocode.trim().to_string();
        discount.kind = req.kind;
        discount.value = req.value;
        discount.is_active = req.is_active;
        discount.expires_at = req.expires_at;
        discount.updated_at = Utc::now();

        self.state.db.discounts().update(&discount).await?;
        info!(discount_id = %id, active = discount.is_active, "Discount updated");

        Ok(discount)
    }

    pub async fn delete(&self, auth: &AuthContext, id: &str) -> ApiResult<()> {
        authorize(auth, Action::ManageDiscounts)?;
        self.state.db.discounts().delete(id).await?;
        info!(discount_id = %id, "Discount deleted");
        Ok(())
    }

    async fn find(&self, id: &str) -> ApiResult<Discount> {
        self.state
            .db
            .discounts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Discount", id))
    }
}

fn validate_request(req: &DiscountRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(validate_promocode(&req.promocode));
    errors.check(match req.kind {
        DiscountKind::Percentage => validate_percentage_bps(req.value),
        DiscountKind::Fixed => validate_amount("value", req.value),
    });
    errors.into_result()
}
