//! Lead entity model and DTOs.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::customer::Customer;
use crate::models::deal::Deal;

/// A row from the `leads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lead {
    pub id: DbId,
    pub tenant_id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub score: i32,
    pub notes: Option<String>,
    pub owner_user_id: Option<DbId>,
    pub converted_customer_id: Option<DbId>,
    pub converted_deal_id: Option<DbId>,
    pub converted_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new lead.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLead {
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    /// Defaults to `new` if omitted.
    pub status: Option<String>,
    pub score: Option<i32>,
    pub notes: Option<String>,
    pub owner_user_id: Option<DbId>,
}

/// DTO for updating a lead. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub score: Option<i32>,
    pub notes: Option<String>,
    pub owner_user_id: Option<DbId>,
}

/// Optional deal to open while converting a lead.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertLeadDeal {
    pub title: String,
    pub value_cents: Option<i64>,
    pub currency: Option<String>,
    pub expected_close_date: Option<chrono::NaiveDate>,
}

/// Request body for converting a lead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertLead {
    pub deal: Option<ConvertLeadDeal>,
}

/// Rows written by a lead conversion.
#[derive(Debug, Clone, Serialize)]
pub struct LeadConversion {
    pub lead: Lead,
    pub customer: Customer,
    pub deal: Option<Deal>,
}
