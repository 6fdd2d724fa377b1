//! Catalog service: products and categories.
//!
//! ## Who may do what
//! ```text
//!                      user   vendor            admin
//! list / get           ✓      ✓                 ✓
//! create product       ✗      ✓ (owns it)       ✓
//! update / restock /
//!   delete product     ✗      own products only ✓
//! category writes      ✗      ✗                 ✓
//! ```

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::api_types::{CategoryRequest, CreateProductRequest, ProductListQuery, UpdateProductRequest};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use meridian_core::validation::{
    validate_amount, validate_category_name, validate_description, validate_product_title, validate_quantity,
    validate_search_query, validate_sku, validate_stock_count,
};
use meridian_core::{
    authorize, Action, AuthContext, Category, CoreError, Page, PageRequest, Pagination, Product, Role,
    ValidationErrors,
};
use meridian_db::{ProductFilter, ProductSort};

/// Default page size for product listings.
pub const PRODUCTS_PAGE_SIZE: i64 = 20;

/// Catalog service.
pub struct CatalogService {
    state: Arc<AppState>,
}

impl CatalogService {
    pub fn new(state: Arc<AppState>) -> Self {
        CatalogService { state }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self, query: ProductListQuery) -> ApiResult<Page<Product>> {
        let search = match query.search.as_deref() {
            Some(s) => Some(validate_search_query(s)?),
            None => None,
        };
        let sort = match query.sort.as_deref() {
            Some(s) => ProductSort::from_str(s)?,
            None => ProductSort::default(),
        };

        let filter = ProductFilter {
            category_id: query.category_id.filter(|c| !c.trim().is_empty()),
            search: search.filter(|s| !s.is_empty()),
            vendor_id: None,
            sort,
        };
        let page = PageRequest::new(query.page, query.limit, PRODUCTS_PAGE_SIZE);

        let (items, total) = self.state.db.products().list(&filter, page).await?;
        Ok(Page {
            items,
            pagination: Pagination::new(total, page.page, page.limit),
        })
    }

    pub async fn get_product(&self, id: &str) -> ApiResult<Product> {
        self.state
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Lists a product. A vendor becomes its owner; admin listings have none.
    pub async fn create_product(&self, auth: &AuthContext, req: CreateProductRequest) -> ApiResult<Product> {
        authorize(auth, Action::CreateProduct)?;

        let mut errors = ValidationErrors::new();
        errors.check(validate_product_title(&req.title));
        errors.check(validate_description(req.description.as_deref()));
        errors.check(validate_amount("price_cents", req.price_cents));
        errors.check(validate_stock_count(req.count_in_stock));
        if let Some(sku) = &req.sku {
            errors.check(validate_sku(sku));
        }
        errors.into_result()?;

        self.ensure_category_exists(req.category_id.as_deref()).await?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            vendor_id: (auth.role == Role::Vendor).then(|| auth.user_id.clone()),
            category_id: req.category_id,
            sku: req.sku.map(|s| s.trim().to_string()),
            title: req.title.trim().to_string(),
            description: req.description,
            image_url: req.image_url,
            price_cents: req.price_cents,
            count_in_stock: req.count_in_stock,
            created_at: now,
            updated_at: now,
        };

        let product = self.state.db.products().insert(&product).await?;
        info!(product_id = %product.id, created_by = %auth.user_id, "Product created");

        Ok(product)
    }

    /// Applies the fields present in `req`; stock is changed via restock.
    pub async fn update_product(
        &self,
        auth: &AuthContext,
        id: &str,
        req: UpdateProductRequest,
    ) -> ApiResult<Product> {
        let mut product = self.get_product(id).await?;
        authorize(
            auth,
            Action::ModifyProduct {
                vendor_id: product.vendor_id.as_deref(),
            },
        )?;

        let mut errors = ValidationErrors::new();
        if let Some(title) = &req.title {
            errors.check(validate_product_title(title));
        }
        errors.check(validate_description(req.description.as_deref()));
        if let Some(price) = req.price_cents {
            errors.check(validate_amount("price_cents", price));
        }
        if let Some(sku) = &req.sku {
            errors.check(validate_sku(sku));
        }
        errors.into_result()?;

        if req.category_id.is_some() {
            self.ensure_category_exists(req.category_id.as_deref()).await?;
        }

        if let Some(title) = req.title {
            product.title = title.trim().to_string();
        }
        if let Some(sku) = req.sku {
            product.sku = Some(sku.trim().to_string());
        }
        if req.description.is_some() {
            product.description = req.description;
        }
        if req.image_url.is_some() {
            product.image_url = req.image_url;
        }
        if req.category_id.is_some() {
            product.category_id = req.category_id;
        }
        if let Some(price) = req.price_cents {
            product.price_cents = price;
        }

        self.state.db.products().update(&product).await?;
        info!(product_id = %id, updated_by = %auth.user_id, "Product updated");

        self.get_product(id).await
    }

    /// Adds units to stock.
    pub async fn restock(&self, auth: &AuthContext, id: &str, quantity: i64) -> ApiResult<Product> {
        let product = self.get_product(id).await?;
        authorize(
            auth,
            Action::ModifyProduct {
                vendor_id: product.vendor_id.as_deref(),
            },
        )?;
        validate_quantity(quantity)?;

        let count = self.state.db.products().restock(id, quantity, Utc::now()).await?;
        info!(product_id = %id, added = quantity, count_in_stock = count, "Product restocked");

        self.get_product(id).await
    }

    pub async fn delete_product(&self, auth: &AuthContext, id: &str) -> ApiResult<()> {
        let product = self.get_product(id).await?;
        authorize(
            auth,
            Action::ModifyProduct {
                vendor_id: product.vendor_id.as_deref(),
            },
        )?;

        self.state.db.products().delete(id).await?;
        info!(product_id = %id, deleted_by = %auth.user_id, "Product deleted");
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: Option<&str>) -> ApiResult<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        match self.state.db.categories().get_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("Category", category_id)),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.state.db.categories().list().await?)
    }

    pub async fn get_category(&self, id: &str) -> ApiResult<Category> {
        self.state
            .db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category", id))
    }

    pub async fn create_category(&self, auth: &AuthContext, req: CategoryRequest) -> ApiResult<Category> {
        authorize(auth, Action::ManageCategories)?;
        validate_category_name(&req.name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            icon: req.icon,
            color: req.color,
            created_at: Utc::now(),
        };

        self.state.db.categories().insert(&category).await?;
        info!(category_id = %category.id, name = %category.name, "Category created");

        Ok(category)
    }

    pub async fn update_category(&self, auth: &AuthContext, id: &str, req: CategoryRequest) -> ApiResult<Category> {
        authorize(auth, Action::ManageCategories)?;
        validate_category_name(&req.name)?;

        let mut category = self.get_category(id).await?;
        category.name = req.name.trim().to_string();
        category.icon = req.icon;
        category.color = req.color;

        self.state.db.categories().update(&category).await?;
        Ok(category)
    }

    pub async fn delete_category(&self, auth: &AuthContext, id: &str) -> ApiResult<()> {
        authorize(auth, Action::ManageCategories)?;
        self.state.db.categories().delete(id).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
