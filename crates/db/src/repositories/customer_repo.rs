//! Repository for the `customers` table.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::customer::{CreateCustomer, Customer, UpdateCustomer};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, tenant_id, name, email, phone, company, status, notes, \
                                   owner_user_id, created_by, created_at, updated_at";

/// Provides tenant-scoped CRUD operations for customers.
pub struct CustomerRepo;

impl CustomerRepo {
    /// Insert a new customer, returning the created row.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        input: &CreateCustomer,
    ) -> Result<Customer, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers
                (tenant_id, name, email, phone, company, status, notes, owner_user_id, created_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'active'), $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.company)
            .bind(&input.status)
            .bind(&input.notes)
            .bind(input.owner_user_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a customer by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's customers, newest first.
    ///
    /// `search` is an `ILIKE` pattern matched against name, email, and company.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        status: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL OR name ILIKE $3 OR email ILIKE $3 OR company ILIKE $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(status)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a customer. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists in the tenant.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "UPDATE customers SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                company = COALESCE($6, company),
                status = COALESCE($7, status),
                notes = COALESCE($8, notes),
                owner_user_id = COALESCE($9, owner_user_id)
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.company)
            .bind(&input.status)
            .bind(&input.notes)
            .bind(input.owner_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a customer. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE customers SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
