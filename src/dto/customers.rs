use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::Membership;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerProfileRequest {
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    /// Defaults to bronze.
    pub membership: Option<Membership>,
}
