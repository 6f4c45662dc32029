use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Cart, CartLine, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// The part of a product shown inside carts and orders.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            unit_price: product.unit_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub product: ProductSummary,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl From<&CartLine> for CartItemDto {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item.id,
            product: ProductSummary::from(&line.product),
            quantity: line.item.quantity,
            total_price: line.total_price(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartDto {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItemDto>,
    pub item_count: usize,
    pub total_price: Decimal,
}

impl CartDto {
    pub fn new(cart: Cart, lines: &[CartLine]) -> Self {
        Self {
            id: cart.id,
            created_at: cart.created_at,
            items: lines.iter().map(CartItemDto::from).collect(),
            item_count: lines.len(),
            total_price: lines.iter().map(CartLine::total_price).sum(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemList {
    pub items: Vec<CartItemDto>,
}
