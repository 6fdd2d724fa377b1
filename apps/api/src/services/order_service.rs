//! Order service: checkout and the order lifecycle.
//!
//! ## Checkout Pipeline
//! ```text
//! create_order
//!   authorize ─► validate body ─► resolve address ─► resolve lines
//!   (request lines, else stored cart) ─► load products ─► stock check
//!   ─► promocode (degrades to none) ─► shipping quote (defaults)
//!   ─► costing ─► INSERT order + lines            [stock/cart untouched]
//!
//! complete_payment
//!   one transaction in OrderRepository::complete_payment:
//!   not_paid→pending ─► decrement stock ─► clear cart ─► commit
//! ```

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api_types::{AllOrdersQuery, CreateOrderRequest, OrderListQuery, PayOrderRequest};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use meridian_core::discount::{self, DiscountResolution};
use meridian_core::validation::{validate_address, validate_cart_size, validate_quantity};
use meridian_core::{
    authorize, order, pricing, shipping, stock, Action, AuthContext, CoreError, Order, OrderStatus, Page,
    PageRequest, Pagination, PaymentConfirmation, ValidationError, ValidationErrors,
};
use meridian_db::{OrderFilter, PaymentCompletion};

/// Default page size for a user's own orders.
pub const USER_ORDERS_PAGE_SIZE: i64 = 10;

/// Default page size for the admin order list.
pub const ALL_ORDERS_PAGE_SIZE: i64 = 20;

/// Order service.
pub struct OrderService {
    state: Arc<AppState>,
}

impl OrderService {
    pub fn new(state: Arc<AppState>) -> Self {
        OrderService { state }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Prices the caller's lines and stores a `not_paid` order.
    pub async fn create_order(&self, auth: &AuthContext, req: CreateOrderRequest) -> ApiResult<Order> {
        authorize(auth, Action::CreateOrder)?;
        validate_create_request(&req)?;

        let now = Utc::now();
        let db = &self.state.db;

        let account = db
            .accounts()
            .get_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

        let address = order::resolve_address(req.address, &account)?;

        let requested = match req.lines {
            Some(lines) => lines,
            None => db.carts().get_or_create(&auth.user_id, now).await?.lines,
        };
        order::ensure_not_empty(&requested)?;

        let ids: Vec<String> = stock::merge_lines(&requested)
            .into_iter()
            .map(|l| l.product_id)
            .collect();
        let products = db.products().get_many(&ids).await?;
        let lines = stock::validate(&requested, &products)?;

        let found = match discount::normalize_code(req.promocode.as_deref()) {
            Some(code) => db.discounts().find_by_code(&code).await?,
            None => None,
        };
        let resolution = discount::resolve(req.promocode.as_deref(), found, now);
        match &resolution {
            DiscountResolution::Rejected { code, reason } => {
                warn!(user_id = %auth.user_id, code = %code, reason = reason.as_str(), "Promocode not applied");
            }
            DiscountResolution::Usable(d) => debug!(code = %d.promocode, "Promocode usable"),
            DiscountResolution::NoCode => {}
        }

        let rate = db
            .shipping_rates()
            .find_by_destination(&address.country, &address.region)
            .await?;
        let quote = shipping::quote(rate.as_ref());
        if quote.is_default() {
            info!(
                country = %address.country,
                region = %address.region,
                rate_cents = quote.rate_cents,
                "No shipping rate for destination, using default"
            );
        }

        let costing = pricing::calculate(&lines, &quote, resolution.usable(), now)?;
        let order = order::new_unpaid_order(
            Uuid::new_v4().to_string(),
            &auth.user_id,
            address,
            lines,
            costing,
            now,
        );

        db.orders().insert(&order).await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            lines = order.lines.len(),
            grand_total = order.costing.grand_total_cents,
            discount_applied = order.costing.discount_applied,
            "Order created"
        );

        Ok(order)
    }

    /// Confirms payment for one of the caller's unpaid orders.
    pub async fn complete_payment(
        &self,
        auth: &AuthContext,
        order_id: &str,
        req: PayOrderRequest,
    ) -> ApiResult<PaymentConfirmation> {
        authorize(auth, Action::CompletePayment)?;

        let outcome = self
            .state
            .db
            .orders()
            .complete_payment(
                order_id,
                &auth.user_id,
                req.payment_details.as_ref(),
                self.state.config.enforce_stock_floor,
                Utc::now(),
            )
            .await?;

        let err = match outcome {
            PaymentCompletion::Completed(confirmation) => return Ok(confirmation),
            PaymentCompletion::OrderMissing => CoreError::OrderNotFound(order_id.to_string()),
            PaymentCompletion::NotOwner => {
                warn!(order_id = %order_id, user_id = %auth.user_id, "Payment attempt on another user's order");
                CoreError::Forbidden
            }
            PaymentCompletion::AlreadyProcessed(status) => CoreError::OrderAlreadyProcessed {
                order_id: order_id.to_string(),
                status,
            },
            PaymentCompletion::StockShortfall {
                product_id,
                title,
                available,
                requested,
            } => CoreError::InsufficientStock {
                product_id,
                title,
                available,
                requested,
            },
            PaymentCompletion::ProductMissing(product_id) => CoreError::ProductNotFound(product_id),
        };

        Err(err.into())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_order(&self, auth: &AuthContext, order_id: &str) -> ApiResult<Order> {
        let order = self
            .state
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        authorize(auth, Action::ViewOrder { owner_id: &order.user_id })?;
        Ok(order)
    }

    pub async fn list_orders_for_user(&self, auth: &AuthContext, query: OrderListQuery) -> ApiResult<Page<Order>> {
        authorize(auth, Action::ListOwnOrders)?;

        let filter = OrderFilter {
            user_id: Some(auth.user_id.clone()),
            status: parse_status_filter(query.status.as_deref())?,
            ..Default::default()
        };
        let page = PageRequest::new(query.page, query.limit, USER_ORDERS_PAGE_SIZE);

        self.list(&filter, page).await
    }

    pub async fn list_all_orders(&self, auth: &AuthContext, query: AllOrdersQuery) -> ApiResult<Page<Order>> {
        authorize(auth, Action::ListAllOrders)?;

        let mut errors = ValidationErrors::new();
        let status = parse_status_filter(query.status.as_deref()).map_err(|e| errors.push(e)).ok().flatten();
        let from = parse_date_bound("from", query.from.as_deref(), false)
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();
        let to = parse_date_bound("to", query.to.as_deref(), true)
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();
        errors.into_result()?;

        let filter = OrderFilter {
            user_id: None,
            status,
            from,
            to,
        };
        let page = PageRequest::new(query.page, query.limit, ALL_ORDERS_PAGE_SIZE);

        self.list(&filter, page).await
    }

    async fn list(&self, filter: &OrderFilter, page: PageRequest) -> ApiResult<Page<Order>> {
        let (items, total) = self.state.db.orders().list(filter, page).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(total, page.page, page.limit),
        })
    }

    // =========================================================================
    // Admin
    // =========================================================================

    pub async fn update_order_status(&self, auth: &AuthContext, order_id: &str, status: &str) -> ApiResult<Order> {
        authorize(auth, Action::UpdateOrderStatus)?;
        let to = OrderStatus::from_str(status)?;

        let orders = self.state.db.orders();
        let current = orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        order::check_status_change(order_id, current.status, to)?;

        if current.status != to && !orders.update_status(order_id, current.status, to, Utc::now()).await? {
            return Err(ApiError::conflict(format!(
                "Order {order_id} changed status while updating, retry"
            )));
        }

        info!(order_id = %order_id, from = %current.status, to = %to, admin = %auth.user_id, "Order status updated");

        orders
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }
}

// =============================================================================
// Input Parsing
// =============================================================================

fn validate_create_request(req: &CreateOrderRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(lines) = &req.lines {
        errors.check(validate_cart_size(lines.len()));
        for line in lines {
            if line.product_id.trim().is_empty() {
                errors.push(ValidationError::Required {
                    field: "product_id".to_string(),
                });
            }
            errors.check(validate_quantity(line.quantity));
        }
    }

    if let Some(address) = &req.address {
        if let Err(address_errors) = validate_address(address) {
            for e in address_errors.0 {
                errors.push(e);
            }
        }
    }

    errors.into_result()
}

/// `None`, blank and `"all"` mean no status filter.
fn parse_status_filter(status: Option<&str>) -> Result<Option<OrderStatus>, ValidationError> {
    match status.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => OrderStatus::from_str(s).map(Some),
    }
}

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` day. A bare day as an
/// upper bound covers the whole day.
fn parse_date_bound(field: &str, value: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected RFC 3339 or YYYY-MM-DD".to_string(),
    })?;

    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };

    Ok(time.map(|t| day.and_time(t).and_utc()))
}
