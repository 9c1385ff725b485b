//! Repository for the `event_bus` table.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::event::{CreateEvent, Event};

/// Column list for `event_bus` queries.
const COLUMNS: &str = "id, tenant_id, name, event_type, source_entity_type, source_entity_id, \
                        actor_user_id, payload, meta, correlation_id, created_at";

/// Provides read/write operations for persisted events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning it.
    pub async fn insert(pool: &PgPool, input: &CreateEvent<'_>) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO event_bus \
                (tenant_id, name, event_type, source_entity_type, source_entity_id, \
                 actor_user_id, payload, meta, correlation_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(input.tenant_id)
            .bind(input.name)
            .bind(input.event_type)
            .bind(input.source_entity_type)
            .bind(input.source_entity_id)
            .bind(input.actor_user_id)
            .bind(input.payload)
            .bind(input.meta)
            .bind(input.correlation_id)
            .fetch_one(pool)
            .await
    }

    /// Find an event belonging to `tenant_id`.
    pub async fn find_in_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM event_bus WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's recent events newest-first, optionally filtered by
    /// name prefix (e.g. `"crm."`).
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        name_prefix: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM event_bus \
             WHERE tenant_id = $1 \
               AND ($2::TEXT IS NULL OR starts_with(name, $2)) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(tenant_id)
            .bind(name_prefix)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
