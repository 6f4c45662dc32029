use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::cart::ProductSummary,
    models::{Order, OrderItem, PaymentStatus, Product},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cart_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDto {
    pub id: Uuid,
    pub product: ProductSummary,
    /// Price captured when the order was placed.
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl OrderItemDto {
    pub fn new(item: &OrderItem, product: &Product) -> Self {
        Self {
            id: item.id,
            product: ProductSummary::from(product),
            unit_price: item.unit_price,
            quantity: item.quantity,
            total_price: item.total_price(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDto {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemDto>,
    pub total_price: Decimal,
}

impl OrderDto {
    pub fn new(order: Order, items: Vec<OrderItemDto>) -> Self {
        let total_price = items.iter().map(|item| item.total_price).sum();
        Self {
            id: order.id,
            customer_id: order.customer_id,
            placed_at: order.placed_at,
            payment_status: order.payment_status,
            items,
            total_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderDto>,
}
