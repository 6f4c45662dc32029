use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductDto, ProductList, UpdateProductRequest},
    error::{AppError, AppResult, Resource},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    repository::{ProductChanges, ProductFilter, ProductSort, SortDirection, UnitOfWork},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

/// Largest price a `NUMERIC(6, 2)` column holds.
fn max_price() -> Decimal {
    Decimal::new(999_999, 2)
}

fn validate_price(price: Decimal) -> AppResult<Decimal> {
    if price < Decimal::ONE {
        return Err(AppError::Validation("unit_price must be at least 1.00".into()));
    }
    if price > max_price() {
        return Err(AppError::Validation(format!(
            "unit_price must not exceed {}",
            max_price()
        )));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::Validation(
            "unit_price must have at most 2 decimal places".into(),
        ));
    }
    let mut price = price;
    price.rescale(2);
    Ok(price)
}

pub(crate) fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    if title.chars().count() > 255 {
        return Err(AppError::Validation("title is too long".into()));
    }
    Ok(title.to_string())
}

fn validate_inventory(inventory: i32) -> AppResult<i32> {
    if inventory < 0 {
        return Err(AppError::Validation("inventory must not be negative".into()));
    }
    Ok(inventory)
}

/// Lowercase ASCII words joined by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// A product may only point at a stored collection.
async fn ensure_collection(uow: &mut dyn UnitOfWork, id: Option<Uuid>) -> AppResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    if uow.collections().find(id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Collection).into_field_error("collection_id"));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> AppResult<String> {
    let slug = slugify(slug);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "slug must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let filter = ProductFilter {
        search: query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        collection_id: query.collection_id,
        price_above: query.min_price,
        price_below: query.max_price,
        sort: query.sort_by.map(ProductSort::from).unwrap_or_default(),
        direction: query.sort_order.map(SortDirection::from).unwrap_or_default(),
        limit: limit as u64,
        offset,
    };

    let mut uow = state.store.begin().await?;
    let (products, total) = uow.products().list(&filter).await?;
    let items = products
        .into_iter()
        .map(|p| ProductDto::new(p, state.tax_rate))
        .collect();

    let meta = Meta::counted(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDto>> {
    let mut uow = state.store.begin().await?;
    let product = uow
        .products()
        .find(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))?;
    Ok(ApiResponse::success(
        "Product",
        ProductDto::new(product, state.tax_rate),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDto>> {
    ensure_admin(user)?;

    let title = validate_title(&payload.title)?;
    let slug = validate_slug(payload.slug.as_deref().unwrap_or(&title))?;
    let product = Product {
        id: Uuid::new_v4(),
        title,
        slug,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        unit_price: validate_price(payload.unit_price)?,
        inventory: validate_inventory(payload.inventory)?,
        last_update: Utc::now(),
        collection_id: payload.collection_id,
    };

    let mut uow = state.store.begin().await?;
    ensure_collection(uow.as_mut(), product.collection_id).await?;
    let product = uow.products().insert(product).await?;
    uow.commit().await?;

    tracing::info!(product_id = %product.id, admin = %user.user_id, "product created");
    Ok(ApiResponse::success(
        "Product created",
        ProductDto::new(product, state.tax_rate),
        None,
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductDto>> {
    ensure_admin(user)?;

    let changes = ProductChanges {
        title: payload.title.as_deref().map(validate_title).transpose()?,
        slug: payload.slug.as_deref().map(validate_slug).transpose()?,
        description: payload
            .description
            .map(|d| Some(d).filter(|d| !d.trim().is_empty())),
        unit_price: payload.unit_price.map(validate_price).transpose()?,
        inventory: payload.inventory.map(validate_inventory).transpose()?,
        collection_id: payload.collection_id,
    };

    let mut uow = state.store.begin().await?;
    ensure_collection(uow.as_mut(), changes.collection_id).await?;
    let product = uow.products().update(id, changes).await?;
    uow.commit().await?;

    tracing::info!(product_id = %id, admin = %user.user_id, "product updated");
    Ok(ApiResponse::success(
        "Product updated",
        ProductDto::new(product, state.tax_rate),
        None,
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDto>> {
    ensure_admin(user)?;

    let mut uow = state.store.begin().await?;
    let product = uow
        .products()
        .find(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))?;
    if uow.order_items().count_for_product(id).await? > 0 {
        return Err(AppError::Conflict(
            "Product cannot be deleted because it is associated with an order item.".into(),
        ));
    }
    uow.products().delete(id).await?;
    uow.commit().await?;

    tracing::info!(product_id = %id, admin = %user.user_id, "product deleted");
    Ok(ApiResponse::success(
        "Product deleted",
        ProductDto::new(product, state.tax_rate),
        None,
    ))
}
