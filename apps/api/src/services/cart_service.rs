//! Cart service.
//!
//! Every mutation follows the same shape:
//!
//! ```text
//! load (or create) cart ─► mutate in memory (meridian_core::Cart)
//!   ─► recompute total at current prices ─► save (replaces lines)
//! ```
//!
//! Stock is checked when adding but never reserved; the authoritative
//! check happens at checkout and again at payment.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::api_types::{AddToCartRequest, CartCountResponse};
use crate::error::ApiResult;
use crate::AppState;
use meridian_core::{authorize, Action, AuthContext, Cart, CoreError};

/// Cart service.
pub struct CartService {
    state: Arc<AppState>,
}

impl CartService {
    pub fn new(state: Arc<AppState>) -> Self {
        CartService { state }
    }

    pub async fn get_cart(&self, auth: &AuthContext) -> ApiResult<Cart> {
        authorize(auth, Action::ManageOwnCart)?;
        Ok(self.state.db.carts().get_or_create(&auth.user_id, Utc::now()).await?)
    }

    /// Sum of quantities across lines.
    pub async fn cart_count(&self, auth: &AuthContext) -> ApiResult<CartCountResponse> {
        let cart = self.get_cart(auth).await?;
        Ok(CartCountResponse {
            count: cart.total_quantity(),
        })
    }

    /// Adds a product, merging with an existing line for it.
    pub async fn add_to_cart(&self, auth: &AuthContext, req: AddToCartRequest) -> ApiResult<Cart> {
        let mut cart = self.get_cart(auth).await?;

        let product = self
            .state
            .db
            .products()
            .get_by_id(&req.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(req.product_id.clone()))?;

        cart.add_line(&product.id, req.quantity)?;

        let merged = cart.quantity_of(&product.id);
        if !product.has_stock_for(merged) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                title: product.title,
                available: product.count_in_stock,
                requested: merged,
            }
            .into());
        }

        debug!(user_id = %auth.user_id, product_id = %product.id, quantity = merged, "Cart line added");
        self.save(cart).await
    }

    /// Sets a line's quantity; 0 removes it.
    pub async fn update_cart_line(&self, auth: &AuthContext, product_id: &str, quantity: i64) -> ApiResult<Cart> {
        let mut cart = self.get_cart(auth).await?;
        cart.set_quantity(product_id, quantity)?;

        if quantity > 0 {
            let product = self
                .state
                .db
                .products()
                .get_by_id(product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

            if !product.has_stock_for(quantity) {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    title: product.title,
                    available: product.count_in_stock,
                    requested: quantity,
                }
                .into());
            }
        }

        self.save(cart).await
    }

    pub async fn remove_cart_line(&self, auth: &AuthContext, product_id: &str) -> ApiResult<Cart> {
        let mut cart = self.get_cart(auth).await?;
        cart.remove_line(product_id)?;
        self.save(cart).await
    }

    pub async fn clear_cart(&self, auth: &AuthContext) -> ApiResult<Cart> {
        authorize(auth, Action::ManageOwnCart)?;
        let now = Utc::now();
        let carts = self.state.db.carts();

        carts.clear(&auth.user_id, now).await?;
        Ok(carts.get_or_create(&auth.user_id, now).await?)
    }

    async fn save(&self, mut cart: Cart) -> ApiResult<Cart> {
        let ids: Vec<String> = cart.lines.iter().map(|l| l.product_id.clone()).collect();
        let prices: HashMap<String, i64> = self
            .state
            .db
            .products()
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|(id, p)| (id, p.price_cents))
            .collect();

        cart.recompute_total(&prices)?;
        cart.updated_at = Utc::now();

        self.state.db.carts().save(&cart).await?;
        Ok(cart)
    }
}
