//! Repository for the `content_items` table.

use atrium_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::content::{ContentItem, UpdateContentItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, title, slug, content_type, status, body, author_user_id, \
                        published_at, created_at, updated_at";

/// Provides tenant-scoped CRUD operations for content items.
pub struct ContentRepo;

impl ContentRepo {
    /// Insert a new draft, returning the created row.
    ///
    /// A live item with the same slug in the tenant fails with a unique
    /// violation on `uq_content_items_tenant_slug`.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        author_user_id: DbId,
        title: &str,
        slug: &str,
        content_type: &str,
        body: &str,
    ) -> Result<ContentItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_items (tenant_id, title, slug, content_type, body, author_user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(tenant_id)
            .bind(title)
            .bind(slug)
            .bind(content_type)
            .bind(body)
            .bind(author_user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a content item by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_items
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live content item by slug within a tenant.
    pub async fn find_by_slug(
        pool: &PgPool,
        tenant_id: DbId,
        slug: &str,
    ) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_items
             WHERE slug = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(slug)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's content items, most recently updated first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        content_type: Option<&str>,
        status: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_items
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::TEXT IS NULL OR content_type = $2)
               AND ($3::TEXT IS NULL OR status = $3)
               AND ($4::TEXT IS NULL OR title ILIKE $4)
             ORDER BY updated_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(tenant_id)
            .bind(content_type)
            .bind(status)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a content item. Only non-`None` fields in `input` are applied;
    /// `published_at` is written as given.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateContentItem,
        published_at: Option<Timestamp>,
    ) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!(
            "UPDATE content_items SET
                title = COALESCE($3, title),
                slug = COALESCE($4, slug),
                content_type = COALESCE($5, content_type),
                status = COALESCE($6, status),
                body = COALESCE($7, body),
                published_at = $8
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.content_type)
            .bind(&input.status)
            .bind(&input.body)
            .bind(published_at)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a content item. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_items SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
