use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, CartDto, CartItemDto, CartItemList, UpdateCartItemRequest},
    error::{AppError, AppResult, Resource},
    models::{Cart, CartItem, CartLine, MAX_QUANTITY},
    repository::UnitOfWork,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::Validation(format!(
            "quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

async fn ensure_cart(uow: &mut dyn UnitOfWork, cart_id: Uuid) -> AppResult<Cart> {
    uow.carts()
        .find(cart_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Cart))
}

async fn find_line(uow: &mut dyn UnitOfWork, cart_id: Uuid, item_id: Uuid) -> AppResult<CartLine> {
    uow.cart_items()
        .lines(cart_id, false)
        .await?
        .into_iter()
        .find(|line| line.item.id == item_id)
        .ok_or(AppError::NotFound(Resource::CartItem))
}

pub async fn create_cart(state: &AppState) -> AppResult<ApiResponse<CartDto>> {
    let mut uow = state.store.begin().await?;
    let cart = uow
        .carts()
        .insert(Cart {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        })
        .await?;
    uow.commit().await?;

    tracing::debug!(cart_id = %cart.id, "cart created");
    Ok(ApiResponse::success(
        "Cart created",
        CartDto::new(cart, &[]),
        Some(Meta::empty()),
    ))
}

pub async fn get_cart(state: &AppState, cart_id: Uuid) -> AppResult<ApiResponse<CartDto>> {
    let mut uow = state.store.begin().await?;
    let cart = ensure_cart(uow.as_mut(), cart_id).await?;
    let lines = uow.cart_items().lines(cart_id, false).await?;
    Ok(ApiResponse::success(
        "OK",
        CartDto::new(cart, &lines),
        Some(Meta::empty()),
    ))
}

pub async fn delete_cart(state: &AppState, cart_id: Uuid) -> AppResult<ApiResponse<CartDto>> {
    let mut uow = state.store.begin().await?;
    let cart = ensure_cart(uow.as_mut(), cart_id).await?;
    let lines = uow.cart_items().lines(cart_id, false).await?;
    uow.carts().delete(cart_id).await?;
    uow.commit().await?;

    Ok(ApiResponse::success(
        "Cart deleted",
        CartDto::new(cart, &lines),
        Some(Meta::empty()),
    ))
}

pub async fn list_items(state: &AppState, cart_id: Uuid) -> AppResult<ApiResponse<CartItemList>> {
    let mut uow = state.store.begin().await?;
    ensure_cart(uow.as_mut(), cart_id).await?;
    let lines = uow.cart_items().lines(cart_id, false).await?;
    let total = lines.len() as i64;
    let items = lines.iter().map(CartItemDto::from).collect();
    Ok(ApiResponse::success(
        "OK",
        CartItemList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartItemDto>> {
    let mut uow = state.store.begin().await?;
    ensure_cart(uow.as_mut(), cart_id).await?;
    let line = find_line(uow.as_mut(), cart_id, item_id).await?;
    Ok(ApiResponse::success(
        "OK",
        CartItemDto::from(&line),
        Some(Meta::empty()),
    ))
}

/// Add a product to a cart. A second add of the same product increases the
/// existing line instead of creating another one.
pub async fn add_item(
    state: &AppState,
    cart_id: Uuid,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<CartItemDto>> {
    validate_quantity(payload.quantity)?;

    let mut uow = state.store.begin().await?;
    ensure_cart(uow.as_mut(), cart_id).await?;
    if uow.products().find(payload.product_id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Product));
    }

    let existing = uow
        .cart_items()
        .find_by_product(cart_id, payload.product_id)
        .await?;
    let item = match existing {
        Some(item) => {
            let quantity = item
                .quantity
                .checked_add(payload.quantity)
                .filter(|q| *q <= MAX_QUANTITY)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "quantity in cart cannot exceed {MAX_QUANTITY}"
                    ))
                })?;
            uow.cart_items().set_quantity(item.id, quantity).await?
        }
        None => {
            uow.cart_items()
                .insert(CartItem {
                    id: Uuid::new_v4(),
                    cart_id,
                    product_id: payload.product_id,
                    quantity: payload.quantity,
                })
                .await?
        }
    };
    let line = find_line(uow.as_mut(), cart_id, item.id).await?;
    uow.commit().await?;

    tracing::debug!(%cart_id, item_id = %item.id, quantity = item.quantity, "cart item saved");
    Ok(ApiResponse::success(
        "Item added",
        CartItemDto::from(&line),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItemDto>> {
    validate_quantity(payload.quantity)?;

    let mut uow = state.store.begin().await?;
    ensure_cart(uow.as_mut(), cart_id).await?;
    uow.cart_items()
        .find(cart_id, item_id)
        .await?
        .ok_or(AppError::NotFound(Resource::CartItem))?;
    uow.cart_items()
        .set_quantity(item_id, payload.quantity)
        .await?;
    let line = find_line(uow.as_mut(), cart_id, item_id).await?;
    uow.commit().await?;

    Ok(ApiResponse::success(
        "Item updated",
        CartItemDto::from(&line),
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(
    state: &AppState,
    cart_id: Uuid,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartItemDto>> {
    let mut uow = state.store.begin().await?;
    ensure_cart(uow.as_mut(), cart_id).await?;
    let line = find_line(uow.as_mut(), cart_id, item_id).await?;
    uow.cart_items().delete(item_id).await?;
    uow.commit().await?;

    Ok(ApiResponse::success(
        "Item removed",
        CartItemDto::from(&line),
        Some(Meta::empty()),
    ))
}
