use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Tag, TaggedKind};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddTagRequest {
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagList {
    pub kind: TaggedKind,
    pub object_id: Uuid,
    pub items: Vec<Tag>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeSummary {
    pub kind: TaggedKind,
    pub object_id: Uuid,
    pub count: u64,
    pub liked_by_me: bool,
}
