//! Shipping rates per `(country, region)`. Reading is public; checkout
//! falls back to the default rate for destinations without one.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::api_types::ShippingRateRequest;
use crate::error::ApiResult;
use crate::AppState;
use meridian_core::shipping::destination_key;
use meridian_core::validation::{validate_amount, validate_country, validate_region};
use meridian_core::{authorize, Action, AuthContext, ShippingRate, ValidationErrors};

pub struct ShippingService {
    state: Arc<AppState>,
}

impl ShippingService {
    pub fn new(state: Arc<AppState>) -> Self {
        ShippingService { state }
    }

    pub async fn list(&self) -> ApiResult<Vec<ShippingRate>> {
        Ok(self.state.db.shipping_rates().list().await?)
    }

    /// ## Returns
    /// * `Err(Conflict)` - the destination already has a rate
    pub async fn create(&self, auth: &AuthContext, req: ShippingRateRequest) -> ApiResult<ShippingRate> {
        authorize(auth, Action::ManageShipping)?;

        let mut errors = ValidationErrors::new();
        errors.check(validate_country(&req.country));
        errors.check(validate_region(&req.region));
        errors.check(validate_amount("rate_cents", req.rate_cents));
        errors.into_result()?;

        let (country, region) = destination_key(&req.country, &req.region);
        let rate = ShippingRate {
            id: Uuid::new_v4().to_string(),
            country: country.to_string(),
            region: region.to_string(),
            rate_cents: req.rate_cents,
            created_at: Utc::now(),
        };

        self.state.db.shipping_rates().insert(&rate).await?;
        info!(rate_id = %rate.id, country = %rate.country, region = %rate.region, "Shipping rate created");

        Ok(rate)
    }

    pub async fn update_rate(&self, auth: &AuthContext, id: &str, rate_cents: i64) -> ApiResult<()> {
        authorize(auth, Action::ManageShipping)?;
        validate_amount("rate_cents", rate_cents)?;

        self.state.db.shipping_rates().update_rate(id, rate_cents).await?;
        info!(rate_id = %id, rate_cents = rate_cents, "Shipping rate updated");
        Ok(())
    }

    pub async fn delete(&self, auth: &AuthContext, id: &str) -> ApiResult<()> {
        authorize(auth, Action::ManageShipping)?;
        self.state.db.shipping_rates().delete(id).await?;
        info!(rate_id = %id, "Shipping rate deleted");
        Ok(())
    }
}
