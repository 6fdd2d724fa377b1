//! Service layer. Each service wraps the shared [`AppState`](crate::AppState)
//! and returns [`ApiResult`](crate::ApiResult); handlers stay thin.

pub mod account_service;
pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod discount_service;
pub mod health_service;
pub mod order_service;
pub mod shipping_service;

pub use account_service::AccountService;
pub use auth_service::AuthService;
pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use discount_service::DiscountService;
pub use health_service::HealthService;
pub use order_service::OrderService;
pub use shipping_service::ShippingService;
