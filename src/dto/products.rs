use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    /// Derived from the title when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub inventory: i32,
    pub collection_id: Option<Uuid>,
}

/// Partial update. An empty `description` clears it.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub inventory: Option<i32>,
    /// Moves the product into another collection.
    pub collection_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDto {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub price_with_tax: Decimal,
    pub inventory: i32,
    pub last_update: DateTime<Utc>,
    pub collection_id: Option<Uuid>,
}

impl ProductDto {
    pub fn new(product: Product, tax_rate: Decimal) -> Self {
        let price_with_tax = (product.unit_price * (Decimal::ONE + tax_rate)).round_dp(2);
        Self {
            id: product.id,
            title: product.title,
            slug: product.slug,
            description: product.description,
            unit_price: product.unit_price,
            price_with_tax,
            inventory: product.inventory,
            last_update: product.last_update,
            collection_id: product.collection_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<ProductDto>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn price_with_tax_rounds_to_cents() {
        let product = Product {
            id: Uuid::new_v4(),
            title: "Mug".into(),
            slug: "mug".into(),
            description: None,
            unit_price: Decimal::new(1999, 2),
            inventory: 3,
            last_update: Utc::now(),
            collection_id: None,
        };
        let dto = ProductDto::new(product, Decimal::new(10, 2));
        assert_eq!(dto.price_with_tax, Decimal::new(2199, 2));
    }
}
