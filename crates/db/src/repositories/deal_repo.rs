//! Repository for the `deals` table.

use atrium_core::crm::StageTotals;
use atrium_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::deal::{CreateDeal, Deal, UpdateDeal};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, tenant_id, customer_id, title, stage, value_cents, currency, \
                                   probability, expected_close_date, closed_at, notes, \
                                   owner_user_id, created_by, created_at, updated_at";

/// Fully-resolved values for a new deal row.
///
/// Built by the caller after defaults (stage, currency, probability) have
/// been applied.
#[derive(Debug, Clone)]
pub struct NewDeal<'a> {
    pub customer_id: Option<DbId>,
    pub title: &'a str,
    pub stage: &'a str,
    pub value_cents: i64,
    pub currency: &'a str,
    pub probability: i32,
    pub expected_close_date: Option<chrono::NaiveDate>,
    pub notes: Option<&'a str>,
    pub owner_user_id: Option<DbId>,
}

impl<'a> NewDeal<'a> {
    /// Resolve a create DTO against the given defaults.
    pub fn from_input(input: &'a CreateDeal, stage: &'a str, currency: &'a str, probability: i32) -> Self {
        Self {
            customer_id: input.customer_id,
            title: &input.title,
            stage,
            value_cents: input.value_cents.unwrap_or(0),
            currency,
            probability,
            expected_close_date: input.expected_close_date,
            notes: input.notes.as_deref(),
            owner_user_id: input.owner_user_id,
        }
    }
}

/// Provides tenant-scoped CRUD operations and pipeline aggregates for deals.
pub struct DealRepo;

impl DealRepo {
    /// Insert a new deal, returning the created row.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        deal: &NewDeal<'_>,
    ) -> Result<Deal, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let row = Self::insert_tx(&mut tx, tenant_id, created_by, deal).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Insert a deal inside an existing transaction.
    pub(crate) async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: DbId,
        created_by: DbId,
        deal: &NewDeal<'_>,
    ) -> Result<Deal, sqlx::Error> {
        let query = format!(
            "INSERT INTO deals
                (tenant_id, customer_id, title, stage, value_cents, currency, probability,
                 expected_close_date, notes, owner_user_id, created_by, closed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                     CASE WHEN $4::TEXT IN ('closed_won', 'closed_lost') THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deal>(&query)
            .bind(tenant_id)
            .bind(deal.customer_id)
            .bind(deal.title)
            .bind(deal.stage)
            .bind(deal.value_cents)
            .bind(deal.currency)
            .bind(deal.probability)
            .bind(deal.expected_close_date)
            .bind(deal.notes)
            .bind(deal.owner_user_id)
            .bind(created_by)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a deal by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Deal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deals
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Deal>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's deals, newest first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        stage: Option<&str>,
        customer_id: Option<DbId>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Deal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deals
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::TEXT IS NULL OR stage = $2)
               AND ($3::BIGINT IS NULL OR customer_id = $3)
               AND ($4::TEXT IS NULL OR title ILIKE $4)
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Deal>(&query)
            .bind(tenant_id)
            .bind(stage)
            .bind(customer_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a deal. Only non-`None` fields in `input` are applied.
    ///
    /// `closed_at` is stamped the first time the deal enters a closed stage.
    /// A closed deal keeps its stage: a stage change against one matches no
    /// row and returns `None`.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateDeal,
    ) -> Result<Option<Deal>, sqlx::Error> {
        let query = format!(
            "UPDATE deals SET
                customer_id = COALESCE($3, customer_id),
                title = COALESCE($4, title),
                stage = COALESCE($5, stage),
                value_cents = COALESCE($6, value_cents),
                currency = COALESCE($7, currency),
                probability = COALESCE($8, probability),
                expected_close_date = COALESCE($9, expected_close_date),
                notes = COALESCE($10, notes),
                owner_user_id = COALESCE($11, owner_user_id),
                closed_at = CASE
                    WHEN closed_at IS NULL AND COALESCE($5, stage) IN ('closed_won', 'closed_lost')
                    THEN NOW()
                    ELSE closed_at
                END
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
               AND (stage NOT IN ('closed_won', 'closed_lost') OR $5 IS NULL OR $5 = stage)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deal>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(input.customer_id)
            .bind(&input.title)
            .bind(&input.stage)
            .bind(input.value_cents)
            .bind(&input.currency)
            .bind(input.probability)
            .bind(input.expected_close_date)
            .bind(&input.notes)
            .bind(input.owner_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a deal. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deals SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-stage counts, values, and probability-weighted values.
    pub async fn stage_totals(pool: &PgPool, tenant_id: DbId) -> Result<Vec<StageTotals>, sqlx::Error> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT stage,
                    COUNT(*)::BIGINT,
                    COALESCE(SUM(value_cents), 0)::BIGINT,
                    COALESCE(SUM(value_cents * probability / 100), 0)::BIGINT
             FROM deals
             WHERE tenant_id = $1 AND deleted_at IS NULL
             GROUP BY stage",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(stage, deal_count, value_cents, weighted_value_cents)| StageTotals {
                stage,
                deal_count,
                value_cents,
                weighted_value_cents,
            })
            .collect())
    }
}
