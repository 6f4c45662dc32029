use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderDto, OrderItemDto, OrderList, UpdateOrderRequest},
    error::{AppError, AppResult, Resource},
    events::OrderCreated,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, PaymentStatus},
    repository::{OrderFilter, SortDirection, UnitOfWork},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

/// Turn a cart into an order.
///
/// Everything happens in one unit of work: the order row, one snapshot line
/// per cart item and the removal of the cart. Any failure drops the unit of
/// work, which rolls all of it back. Hooks run only after the commit.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDto>> {
    let cart_id = payload.cart_id;
    let mut uow = state.store.begin().await?;

    if uow.carts().find(cart_id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Cart));
    }

    let lines = uow.cart_items().lines(cart_id, true).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let customer = uow
        .customers()
        .find_by_user(user.user_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Customer))?;

    let order = uow
        .orders()
        .insert(Order {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            payment_status: PaymentStatus::Pending,
            placed_at: Utc::now(),
        })
        .await?;

    let items: Vec<OrderItem> = lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_id: line.product.id,
            quantity: line.item.quantity,
            unit_price: line.product.unit_price,
        })
        .collect();
    let items = uow.order_items().insert_many(items).await?;

    uow.carts().delete(cart_id).await?;
    uow.commit().await?;

    tracing::debug!(order_id = %order.id, %cart_id, lines = items.len(), "checkout committed");

    let dto_items = items
        .iter()
        .zip(lines.iter())
        .map(|(item, line)| OrderItemDto::new(item, &line.product))
        .collect();
    let dto = OrderDto::new(order.clone(), dto_items);

    state
        .hooks
        .order_created(&OrderCreated {
            order,
            items,
            user_id: user.user_id,
        })
        .await;

    Ok(ApiResponse::success("Order created", dto, Some(Meta::empty())))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDto>> {
    let mut uow = state.store.begin().await?;
    let order = uow
        .orders()
        .find(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Order))?;

    if !user.is_admin() {
        let owner = uow.customers().find(order.customer_id).await?;
        if owner.map(|c| c.user_id) != Some(user.user_id) {
            return Err(AppError::NotFound(Resource::Order));
        }
    }

    let dto = order_dto(uow.as_mut(), order).await?;
    Ok(ApiResponse::success("OK", dto, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut uow = state.store.begin().await?;

    let customer_id = if user.is_admin() {
        None
    } else {
        match uow.customers().find_by_user(user.user_id).await? {
            Some(customer) => Some(customer.id),
            None => {
                return Ok(ApiResponse::success(
                    "Ok",
                    OrderList { items: Vec::new() },
                    Some(Meta::new(page, limit, 0)),
                ));
            }
        }
    };

    let filter = OrderFilter {
        customer_id,
        payment_status: query.payment_status,
        direction: query
            .sort_order
            .map(SortDirection::from)
            .unwrap_or(SortDirection::Desc),
        limit: limit as u64,
        offset,
    };
    let (orders, total) = uow.orders().list(&filter).await?;

    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        items.push(order_dto(uow.as_mut(), order).await?);
    }

    let meta = Meta::counted(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderDto>> {
    ensure_admin(user)?;

    let mut uow = state.store.begin().await?;
    let order = uow
        .orders()
        .set_payment_status(id, payload.payment_status)
        .await?;
    let dto = order_dto(uow.as_mut(), order).await?;
    uow.commit().await?;

    tracing::info!(order_id = %id, status = ?payload.payment_status, admin = %user.user_id, "payment status updated");
    Ok(ApiResponse::success(
        "Payment status updated",
        dto,
        Some(Meta::empty()),
    ))
}

async fn order_dto(uow: &mut dyn UnitOfWork, order: Order) -> AppResult<OrderDto> {
    let items = uow.order_items().for_order(order.id).await?;
    let mut dto_items = Vec::with_capacity(items.len());
    for item in &items {
        let product = uow
            .products()
            .find(item.product_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Product))?;
        dto_items.push(OrderItemDto::new(item, &product));
    }
    Ok(OrderDto::new(order, dto_items))
}
