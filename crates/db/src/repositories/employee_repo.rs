//! Repository for the `employees` table.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::employee::{CreateEmployee, Employee, UpdateEmployee};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, user_id, first_name, last_name, email, job_title, \
                        department, employment_status, hired_on, created_by, created_at, updated_at";

/// Provides tenant-scoped CRUD operations for employees.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert a new employee, returning the created row.
    ///
    /// A second live employee with the same email in the tenant fails with a
    /// unique violation on `uq_employees_tenant_email`.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        input: &CreateEmployee,
    ) -> Result<Employee, sqlx::Error> {
        let query = format!(
            "INSERT INTO employees
                (tenant_id, user_id, first_name, last_name, email, job_title, department,
                 employment_status, hired_on, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 'active'), $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(tenant_id)
            .bind(input.user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.job_title)
            .bind(&input.department)
            .bind(&input.employment_status)
            .bind(input.hired_on)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find an employee by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's employees ordered by last name, first name.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        department: Option<&str>,
        employment_status: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::TEXT IS NULL OR department = $2)
               AND ($3::TEXT IS NULL OR employment_status = $3)
               AND ($4::TEXT IS NULL
                    OR first_name ILIKE $4 OR last_name ILIKE $4 OR email ILIKE $4)
             ORDER BY last_name ASC, first_name ASC, id ASC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(tenant_id)
            .bind(department)
            .bind(employment_status)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update an employee. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateEmployee,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!(
            "UPDATE employees SET
                user_id = COALESCE($3, user_id),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                email = COALESCE($6, email),
                job_title = COALESCE($7, job_title),
                department = COALESCE($8, department),
                employment_status = COALESCE($9, employment_status),
                hired_on = COALESCE($10, hired_on)
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(input.user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.job_title)
            .bind(&input.department)
            .bind(&input.employment_status)
            .bind(input.hired_on)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete an employee. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE employees SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
