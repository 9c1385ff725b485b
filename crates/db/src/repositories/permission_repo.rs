//! Repository for `permissions`, `role_permissions`, and `permission_grants`.

use atrium_core::permissions::{AccessProfile, DirectGrant};
use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::permission::{PermissionDef, PermissionGrant};

/// Columns for [`PermissionGrant`], selected from `permission_grants g JOIN permissions p`.
const GRANT_COLUMNS: &str =
    "g.id, g.user_id, p.key AS permission, g.tenant_id, g.granted_by, g.created_at";

/// Provides lookups for the permission gate and grant management.
pub struct PermissionRepo;

impl PermissionRepo {
    /// List the permission catalogue ordered by key.
    pub async fn list_catalog(pool: &PgPool) -> Result<Vec<PermissionDef>, sqlx::Error> {
        sqlx::query_as::<_, PermissionDef>(
            "SELECT id, key, description FROM permissions ORDER BY key",
        )
        .fetch_all(pool)
        .await
    }

    /// Load everything needed to evaluate permissions for `user_id`.
    ///
    /// Returns `None` for an unknown user; the gate treats that as deny.
    pub async fn load_profile(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<AccessProfile>, sqlx::Error> {
        let user: Option<(bool, String, Option<DbId>, DbId)> = sqlx::query_as(
            "SELECT u.is_active, r.name, u.tenant_id, u.role_id
             FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        let Some((is_active, role, home_tenant_id, role_id)) = user else {
            return Ok(None);
        };

        let role_permissions: Vec<String> = sqlx::query_scalar(
            "SELECT p.key FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             WHERE rp.role_id = $1",
        )
        .bind(role_id)
        .fetch_all(pool)
        .await?;

        let grants: Vec<(String, Option<DbId>)> = sqlx::query_as(
            "SELECT p.key, g.tenant_id FROM permission_grants g
             JOIN permissions p ON p.id = g.permission_id
             WHERE g.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(Some(AccessProfile {
            user_id,
            is_active,
            role,
            home_tenant_id,
            role_permissions,
            grants: grants
                .into_iter()
                .map(|(permission, tenant_id)| DirectGrant {
                    permission,
                    tenant_id,
                })
                .collect(),
        }))
    }

    /// List the direct grants held by a user.
    pub async fn list_grants_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PermissionGrant>, sqlx::Error> {
        let query = format!(
            "SELECT {GRANT_COLUMNS} FROM permission_grants g
             JOIN permissions p ON p.id = g.permission_id
             WHERE g.user_id = $1
             ORDER BY p.key, g.tenant_id NULLS FIRST"
        );
        sqlx::query_as::<_, PermissionGrant>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find a single grant by ID.
    pub async fn find_grant(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PermissionGrant>, sqlx::Error> {
        let query = format!(
            "SELECT {GRANT_COLUMNS} FROM permission_grants g
             JOIN permissions p ON p.id = g.permission_id
             WHERE g.id = $1"
        );
        sqlx::query_as::<_, PermissionGrant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a direct grant.
    ///
    /// Returns `None` if `permission_key` is not in the catalogue. A repeated
    /// grant fails with a unique violation on
    /// `uq_permission_grants_user_permission_tenant`.
    pub async fn grant(
        pool: &PgPool,
        user_id: DbId,
        permission_key: &str,
        tenant_id: Option<DbId>,
        granted_by: DbId,
    ) -> Result<Option<PermissionGrant>, sqlx::Error> {
        sqlx::query_as::<_, PermissionGrant>(
            "WITH inserted AS (
                INSERT INTO permission_grants (user_id, permission_id, tenant_id, granted_by)
                SELECT $1, p.id, $3, $4 FROM permissions p WHERE p.key = $2
                RETURNING id, user_id, permission_id, tenant_id, granted_by, created_at
             )
             SELECT i.id, i.user_id, p.key AS permission, i.tenant_id, i.granted_by, i.created_at
             FROM inserted i JOIN permissions p ON p.id = i.permission_id",
        )
        .bind(user_id)
        .bind(permission_key)
        .bind(tenant_id)
        .bind(granted_by)
        .fetch_optional(pool)
        .await
    }

    /// Delete a grant. Returns `true` if a row was removed.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permission_grants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
