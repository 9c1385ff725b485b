//! Repository for the `users` table.

use atrium_core::roles::ROLE_ID_SUPER_ADMIN;
use atrium_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::user::{CreateUser, UpdateUser, User, UserResponse};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, username, email, display_name, password_hash, role_id, \
                        is_active, last_login_at, failed_login_count, locked_until, \
                        created_at, updated_at";

/// Columns for [`UserResponse`], selected from `users u JOIN roles r`.
const RESPONSE_COLUMNS: &str = "u.id, u.tenant_id, u.username, u.email, u.display_name, \
                                 r.name AS role, u.role_id, u.is_active, u.last_login_at, \
                                 u.created_at";

fn insert_query() -> String {
    format!(
        "INSERT INTO users (tenant_id, username, email, display_name, password_hash, role_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    )
}

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = insert_query();
        sqlx::query_as::<_, User>(&query)
            .bind(input.tenant_id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    /// Insert a user inside an existing transaction.
    pub(crate) async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let query = insert_query();
        sqlx::query_as::<_, User>(&query)
            .bind(input.tenant_id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email. Emails are stored normalized, so callers must
    /// normalize before looking up.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find the API representation of a user, regardless of tenant.
    pub async fn find_response(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1"
        );
        sqlx::query_as::<_, UserResponse>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user belonging to `tenant_id`. Users of other tenants are
    /// reported as missing.
    pub async fn find_in_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<UserResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1 AND u.tenant_id = $2"
        );
        sqlx::query_as::<_, UserResponse>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List the users of a tenant, newest first.
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.tenant_id = $1 AND ($2 OR u.is_active = true)
             ORDER BY u.created_at DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, UserResponse>(&query)
            .bind(tenant_id)
            .bind(include_inactive)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                display_name = COALESCE($4, display_name),
                role_id = COALESCE($5, role_id),
                is_active = COALESCE($6, is_active),
                tenant_id = CASE WHEN $5 = $7 THEN NULL ELSE tenant_id END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(input.role_id)
            .bind(input.is_active)
            .bind(ROLE_ID_SUPER_ADMIN)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a user, overwrite their identifying fields, and revoke every
    /// session, all in one transaction.
    ///
    /// Returns `false` if the user does not exist or was already deleted.
    /// A deactivated user can still be deleted.
    pub async fn soft_delete(
        pool: &PgPool,
        id: DbId,
        anonymized_email: &str,
        anonymized_username: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET
                is_active = false,
                email = $2,
                username = $3,
                display_name = NULL,
                password_hash = '!'
             WHERE id = $1 AND password_hash <> '!'",
        )
        .bind(id)
        .bind(anonymized_email)
        .bind(anonymized_username)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM permission_grants WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Increment the failed login counter by 1, returning the new count.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET failed_login_count = failed_login_count + 1
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset `failed_login_count` to 0, clear `locked_until`,
    /// and set `last_login_at` to now.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Replace a user's password hash and clear any lockout.
    ///
    /// Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, failed_login_count = 0, locked_until = NULL
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// IDs of every active super admin, used to fan out `system.*` events.
    pub async fn list_active_super_admin_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE role_id = $1 AND is_active = true")
            .bind(ROLE_ID_SUPER_ADMIN)
            .fetch_all(pool)
            .await
    }

    /// Whether at least one active super admin exists.
    pub async fn super_admin_exists(pool: &PgPool) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role_id = $1 AND is_active = true)",
        )
        .bind(ROLE_ID_SUPER_ADMIN)
        .fetch_one(pool)
        .await
    }

    /// Check which of `user_ids` are active members of `tenant_id`.
    pub async fn filter_tenant_members(
        pool: &PgPool,
        tenant_id: DbId,
        user_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM users
             WHERE tenant_id = $1 AND is_active = true AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(user_ids)
        .fetch_all(pool)
        .await
    }
}
