//! Deal (sales opportunity) entity model and DTOs.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `deals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deal {
    pub id: DbId,
    pub tenant_id: DbId,
    pub customer_id: Option<DbId>,
    pub title: String,
    pub stage: String,
    pub value_cents: i64,
    pub currency: String,
    pub probability: i32,
    pub expected_close_date: Option<chrono::NaiveDate>,
    pub closed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub owner_user_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new deal.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeal {
    pub customer_id: Option<DbId>,
    pub title: String,
    /// Defaults to `prospecting` if omitted.
    pub stage: Option<String>,
    pub value_cents: Option<i64>,
    /// Defaults to `USD` if omitted.
    pub currency: Option<String>,
    /// Defaults to the stage's default probability if omitted.
    pub probability: Option<i32>,
    pub expected_close_date: Option<chrono::NaiveDate>,
    pub notes: Option<String>,
    pub owner_user_id: Option<DbId>,
}

/// DTO for updating a deal. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDeal {
    pub customer_id: Option<DbId>,
    pub title: Option<String>,
    pub stage: Option<String>,
    pub value_cents: Option<i64>,
    pub currency: Option<String>,
    pub probability: Option<i32>,
    pub expected_close_date: Option<chrono::NaiveDate>,
    pub notes: Option<String>,
    pub owner_user_id: Option<DbId>,
}
