//! Repository for the `audit_logs` table.
//!
//! Appends are serialized with a transaction-scoped advisory lock so the
//! integrity hash chain stays linear under concurrent writers.

use atrium_core::audit::{self, ChainFields, ChainLink, AUDIT_CHAIN_LOCK_ID};
use atrium_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, timestamp, tenant_id, user_id, request_id, action_type, \
    entity_type, entity_id, details_json, ip_address, \
    user_agent, integrity_hash, created_at";

/// Column list for INSERT (excludes auto-generated `id` and `created_at`).
const INSERT_COLUMNS: &str = "\
    timestamp, tenant_id, user_id, request_id, action_type, entity_type, entity_id, \
    details_json, ip_address, user_agent, integrity_hash";

/// Hard cap on rows returned by one query page.
const MAX_PAGE_SIZE: i64 = 500;

// ---------------------------------------------------------------------------
// AuditLogRepo
// ---------------------------------------------------------------------------

/// Provides append, query, and verification operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry to the chain.
    ///
    /// Takes the chain lock, reads the previous hash, and inserts the new row
    /// with its hash in the same transaction.
    pub async fn append(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(AUDIT_CHAIN_LOCK_ID)
            .execute(&mut *tx)
            .await?;

        let prev_hash: Option<String> = sqlx::query_scalar::<_, Option<String>>(
            "SELECT integrity_hash FROM audit_logs
             WHERE integrity_hash IS NOT NULL
             ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?
        .flatten();

        let timestamp = audit::chain_timestamp(chrono::Utc::now());
        let canonical = audit::canonical_entry(&ChainFields {
            timestamp,
            tenant_id: entry.tenant_id,
            user_id: entry.user_id,
            request_id: entry.request_id.as_deref(),
            action_type: &entry.action_type,
            entity_type: entry.entity_type.as_deref(),
            entity_id: entry.entity_id,
            details: entry.details_json.as_ref(),
            ip_address: entry.ip_address.as_deref(),
            user_agent: entry.user_agent.as_deref(),
        });
        let integrity_hash = audit::compute_integrity_hash(prev_hash.as_deref(), &canonical);

        let query = format!(
            "INSERT INTO audit_logs ({INSERT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AuditLog>(&query)
            .bind(timestamp)
            .bind(entry.tenant_id)
            .bind(entry.user_id)
            .bind(&entry.request_id)
            .bind(&entry.action_type)
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.details_json)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(&integrity_hash)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(audit_id = row.id, action = %row.action_type, "Audit entry appended");
        Ok(row)
    }

    /// Query a tenant's audit logs with filtering and pagination, newest first.
    pub async fn query(
        pool: &PgPool,
        tenant_id: DbId,
        params: &AuditQuery,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
        let offset = params.offset.unwrap_or(0).max(0);

        let (where_clause, bind_values, bind_idx) = build_audit_filter(tenant_id, params);

        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs {where_clause} \
             ORDER BY timestamp DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_audit_values(sqlx::query_as::<_, AuditLog>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count a tenant's audit logs matching the given filter.
    pub async fn count(
        pool: &PgPool,
        tenant_id: DbId,
        params: &AuditQuery,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_audit_filter(tenant_id, params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM audit_logs {where_clause}");

        let q = bind_audit_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }

    /// Export a tenant's entries within a time range, oldest first.
    pub async fn export_range(
        pool: &PgPool,
        tenant_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE tenant_id = $1 AND timestamp >= $2 AND timestamp <= $3 \
             ORDER BY timestamp ASC, id ASC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Load the whole chain in id order, reduced to what verification needs.
    pub async fn load_chain(pool: &PgPool) -> Result<Vec<ChainLink>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AuditLog>(&format!(
            "SELECT {COLUMNS} FROM audit_logs ORDER BY id ASC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ChainLink {
                id: row.id,
                canonical: audit::canonical_entry(&ChainFields {
                    timestamp: row.timestamp,
                    tenant_id: row.tenant_id,
                    user_id: row.user_id,
                    request_id: row.request_id.as_deref(),
                    action_type: &row.action_type,
                    entity_type: row.entity_type.as_deref(),
                    entity_id: row.entity_id,
                    details: row.details_json.as_ref(),
                    ip_address: row.ip_address.as_deref(),
                    user_agent: row.user_agent.as_deref(),
                }),
                integrity_hash: row.integrity_hash,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built audit log queries.
enum BindValue {
    BigInt(i64),
    Text(String),
    Timestamp(Timestamp),
}

/// Build the `WHERE` clause for a tenant-scoped audit query.
///
/// Returns the clause, the values to bind in order, and the next free
/// placeholder index.
fn build_audit_filter(tenant_id: DbId, params: &AuditQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions = vec!["tenant_id = $1".to_string()];
    let mut bind_values = vec![BindValue::BigInt(tenant_id)];
    let mut bind_idx = 2u32;

    if let Some(user_id) = params.user_id {
        conditions.push(format!("user_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(user_id));
    }

    if let Some(ref action_type) = params.action_type {
        conditions.push(format!("action_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(action_type.clone()));
    }

    if let Some(ref entity_type) = params.entity_type {
        conditions.push(format!("entity_type = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(entity_type.clone()));
    }

    if let Some(entity_id) = params.entity_id {
        conditions.push(format!("entity_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(entity_id));
    }

    if let Some(from) = params.from {
        conditions.push(format!("timestamp >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.to {
        conditions.push(format!("timestamp <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    (
        format!("WHERE {}", conditions.join(" AND ")),
        bind_values,
        bind_idx,
    )
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_audit_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_audit_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
