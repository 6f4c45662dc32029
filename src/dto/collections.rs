use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Collection;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CollectionRequest {
    pub title: String,
    pub featured_product_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCollectionRequest {
    pub title: Option<String>,
    pub featured_product_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionDto {
    pub id: Uuid,
    pub title: String,
    pub featured_product_id: Option<Uuid>,
    /// Number of products in the collection.
    pub product_count: u64,
}

impl CollectionDto {
    pub fn new(collection: Collection, product_count: u64) -> Self {
        Self {
            id: collection.id,
            title: collection.title,
            featured_product_id: collection.featured_product_id,
            product_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionList {
    pub items: Vec<CollectionDto>,
}
