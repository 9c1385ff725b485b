//! Repository for the `leads` table, including lead conversion.

use atrium_core::crm::{CUSTOMER_ACTIVE, LEAD_CONVERTED};
use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::customer::Customer;
use crate::models::lead::{CreateLead, Lead, LeadConversion, UpdateLead};
use crate::repositories::customer_repo;
use crate::repositories::deal_repo::{DealRepo, NewDeal};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, name, email, company, source, status, score, notes, \
                        owner_user_id, converted_customer_id, converted_deal_id, converted_at, \
                        created_by, created_at, updated_at";

/// Provides tenant-scoped CRUD operations for leads.
pub struct LeadRepo;

impl LeadRepo {
    /// Insert a new lead, returning the created row.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        input: &CreateLead,
    ) -> Result<Lead, sqlx::Error> {
        let query = format!(
            "INSERT INTO leads
                (tenant_id, name, email, company, source, status, score, notes, owner_user_id, created_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'new'), COALESCE($7, 0), $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.company)
            .bind(&input.source)
            .bind(&input.status)
            .bind(input.score)
            .bind(&input.notes)
            .bind(input.owner_user_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a lead by ID within a tenant. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM leads
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's leads, highest score first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: DbId,
        status: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lead>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM leads
             WHERE tenant_id = $1 AND deleted_at IS NULL
               AND ($2::TEXT IS NULL OR status = $2)
               AND ($3::TEXT IS NULL OR name ILIKE $3 OR email ILIKE $3 OR company ILIKE $3)
             ORDER BY score DESC, created_at DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(tenant_id)
            .bind(status)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a lead. Only non-`None` fields in `input` are applied.
    ///
    /// A converted lead keeps its status: a status change against one matches
    /// no row and returns `None`, even if the caller read the lead before it
    /// was converted.
    pub async fn update(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateLead,
    ) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "UPDATE leads SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                company = COALESCE($5, company),
                source = COALESCE($6, source),
                status = COALESCE($7, status),
                score = COALESCE($8, score),
                notes = COALESCE($9, notes),
                owner_user_id = COALESCE($10, owner_user_id)
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL
               AND (status <> $11 OR $7 IS NULL OR $7 = status)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.company)
            .bind(&input.source)
            .bind(&input.status)
            .bind(input.score)
            .bind(&input.notes)
            .bind(input.owner_user_id)
            .bind(LEAD_CONVERTED)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a lead. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE leads SET deleted_at = NOW()
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Convert a lead into a customer, optionally opening a deal for it.
    ///
    /// Runs in one transaction. The lead row is locked with `FOR UPDATE` and
    /// must not already be converted; returns `None` if the lead is missing
    /// or was converted concurrently.
    pub async fn convert(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
        actor_id: DbId,
        deal: Option<NewDeal<'_>>,
    ) -> Result<Option<LeadConversion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let lock_query = format!(
            "SELECT {COLUMNS} FROM leads
             WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL AND status <> $3
             FOR UPDATE"
        );
        let Some(lead) = sqlx::query_as::<_, Lead>(&lock_query)
            .bind(id)
            .bind(tenant_id)
            .bind(LEAD_CONVERTED)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            tracing::debug!(tenant_id, lead_id = id, "Lead missing or already converted");
            return Ok(None);
        };

        let customer_query = format!(
            "INSERT INTO customers
                (tenant_id, name, email, company, status, notes, owner_user_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            customer_repo::COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&customer_query)
            .bind(tenant_id)
            .bind(&lead.name)
            .bind(&lead.email)
            .bind(&lead.company)
            .bind(CUSTOMER_ACTIVE)
            .bind(&lead.notes)
            .bind(lead.owner_user_id)
            .bind(actor_id)
            .fetch_one(&mut *tx)
            .await?;

        let deal = match deal {
            Some(mut new_deal) => {
                new_deal.customer_id = Some(customer.id);
                if new_deal.owner_user_id.is_none() {
                    new_deal.owner_user_id = lead.owner_user_id;
                }
                Some(DealRepo::insert_tx(&mut tx, tenant_id, actor_id, &new_deal).await?)
            }
            None => None,
        };

        let update_query = format!(
            "UPDATE leads SET
                status = $3,
                converted_customer_id = $4,
                converted_deal_id = $5,
                converted_at = NOW()
             WHERE id = $1 AND tenant_id = $2
             RETURNING {COLUMNS}"
        );
        let lead = sqlx::query_as::<_, Lead>(&update_query)
            .bind(id)
            .bind(tenant_id)
            .bind(LEAD_CONVERTED)
            .bind(customer.id)
            .bind(deal.as_ref().map(|d| d.id))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(LeadConversion {
            lead,
            customer,
            deal,
        }))
    }
}
