//! Content item entity model and DTOs.

use atrium_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `content_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentItem {
    pub id: DbId,
    pub tenant_id: DbId,
    pub title: String,
    pub slug: String,
    pub content_type: String,
    pub status: String,
    pub body: String,
    pub author_user_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a content item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentItem {
    pub title: String,
    /// Derived from the title if omitted.
    pub slug: Option<String>,
    /// Defaults to `article` if omitted.
    pub content_type: Option<String>,
    pub body: Option<String>,
}

/// DTO for updating a content item. All fields are optional.
///
/// `published_at` is not accepted from clients; the repository receives the
/// value computed from the status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContentItem {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content_type: Option<String>,
    pub status: Option<String>,
    pub body: Option<String>,
}
