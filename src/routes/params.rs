use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{PaymentStatus, TaggedKind},
    repository::{ProductSort, SortDirection},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// Returns `(page, per_page, offset)` with out-of-range values clamped.
    /// The offset saturates instead of overflowing on very large pages.
    pub fn normalize(&self) -> (i64, i64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset.unsigned_abs())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => SortDirection::Asc,
            SortOrder::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    Title,
    UnitPrice,
    LastUpdate,
}

impl From<ProductSortBy> for ProductSort {
    fn from(sort: ProductSortBy) -> Self {
        match sort {
            ProductSortBy::Title => ProductSort::Title,
            ProductSortBy::UnitPrice => ProductSort::UnitPrice,
            ProductSortBy::LastUpdate => ProductSort::LastUpdate,
        }
    }
}

// Query strings are flat; `serde(flatten)` would turn every value into a
// string, so pagination fields are repeated here.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive match on title or description.
    pub q: Option<String>,
    /// Only products in this collection.
    pub collection_id: Option<Uuid>,
    /// Only products priced strictly above this value.
    pub min_price: Option<Decimal>,
    /// Only products priced strictly below this value.
    pub max_price: Option<Decimal>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub payment_status: Option<PaymentStatus>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Parse the `{kind}` path segment of tag and like routes.
pub fn parse_kind(raw: &str) -> AppResult<TaggedKind> {
    raw.parse::<TaggedKind>().map_err(AppError::Validation)
}
