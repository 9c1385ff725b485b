//! Repository for the `tenants` table.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use crate::models::user::{CreateUser, User};
use crate::repositories::UserRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, plan, settings, is_active, created_at, updated_at";

/// Provides CRUD operations for tenants.
pub struct TenantRepo;

impl TenantRepo {
    /// Insert a new tenant, returning the created row.
    ///
    /// A duplicate slug fails with a unique violation on `uq_tenants_slug`.
    pub async fn create(pool: &PgPool, input: &CreateTenant) -> Result<Tenant, sqlx::Error> {
        let query = format!(
            "INSERT INTO tenants (name, slug, plan, settings)
             VALUES ($1, $2, COALESCE($3, 'free'), COALESCE($4, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tenant>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.plan)
            .bind(&input.settings)
            .fetch_one(pool)
            .await
    }

    /// Create a tenant and, optionally, its first user in one transaction.
    ///
    /// `admin.tenant_id` is overwritten with the new tenant's id. If the user
    /// insert fails (e.g. duplicate email) the tenant is rolled back too.
    pub async fn create_with_admin(
        pool: &PgPool,
        input: &CreateTenant,
        admin: Option<CreateUser>,
    ) -> Result<(Tenant, Option<User>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO tenants (name, slug, plan, settings)
             VALUES ($1, $2, COALESCE($3, 'free'), COALESCE($4, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        let tenant = sqlx::query_as::<_, Tenant>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.plan)
            .bind(&input.settings)
            .fetch_one(&mut *tx)
            .await?;

        let user = match admin {
            Some(mut admin) => {
                admin.tenant_id = Some(tenant.id);
                Some(UserRepo::insert_tx(&mut tx, &admin).await?)
            }
            None => None,
        };

        tx.commit().await?;
        Ok((tenant, user))
    }

    /// Find a tenant by ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tenant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tenants WHERE id = $1");
        sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Tenant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tenants WHERE slug = $1");
        sqlx::query_as::<_, Tenant>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List tenants ordered by name. Inactive tenants are included only when
    /// `include_inactive` is set.
    pub async fn list(
        pool: &PgPool,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Tenant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tenants
             WHERE ($1 OR is_active = true)
             ORDER BY name ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Tenant>(&query)
            .bind(include_inactive)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a tenant. Only non-`None` fields in `input` are applied; settings
    /// are merged with `||` so unspecified keys survive.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTenant,
    ) -> Result<Option<Tenant>, sqlx::Error> {
        let query = format!(
            "UPDATE tenants SET
                name = COALESCE($2, name),
                plan = COALESCE($3, plan),
                settings = settings || COALESCE($4, '{{}}'::jsonb)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tenant>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.plan)
            .bind(&input.settings)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a tenant. Returns `true` if the row changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tenants SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the tenant exists and is active.
    pub async fn is_active(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let active: Option<bool> = sqlx::query_scalar("SELECT is_active FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(active.unwrap_or(false))
    }

    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE is_active = true")
            .fetch_one(pool)
            .await
    }
}
