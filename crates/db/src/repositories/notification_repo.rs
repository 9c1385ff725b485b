//! Per-user notifications. Each row points at the `event_bus` entry it was
//! created for; name, type, and payload are read through that join.

use atrium_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::Notification;

/// Selected from `notifications n JOIN event_bus e`.
const COLUMNS: &str = "n.id, n.event_id, n.user_id, e.tenant_id, e.name AS event_name, \
                        e.event_type, e.payload, n.is_read, n.read_at, n.is_delivered, \
                        n.delivered_at, n.created_at";

pub struct NotificationRepo;

impl NotificationRepo {
    /// Returns `None` when `user_id` already has a notification for the event.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        user_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (event_id, user_id) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_notifications_event_user DO NOTHING \
             RETURNING id",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND n.is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications n \
             JOIN event_bus e ON e.id = n.event_id \
             WHERE n.user_id = $1 {filter} \
             ORDER BY n.created_at DESC, n.id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Claim up to `limit` of `user_id`'s undelivered notifications, oldest
    /// first, marking them delivered in the same statement.
    ///
    /// Two callers racing for the same rows each get a disjoint set.
    pub async fn claim_undelivered(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "WITH claimed AS ( \
                 UPDATE notifications SET is_delivered = true, delivered_at = NOW() \
                 WHERE id IN ( \
                     SELECT id FROM notifications \
                     WHERE user_id = $1 AND is_delivered = false \
                     ORDER BY created_at ASC, id ASC \
                     LIMIT $2 \
                     FOR UPDATE SKIP LOCKED) \
                   AND is_delivered = false \
                 RETURNING * \
             ) \
             SELECT {COLUMNS} FROM claimed n \
             JOIN event_bus e ON e.id = n.event_id \
             ORDER BY n.created_at ASC, n.id ASC"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// `false` when the notification is not `user_id`'s. Repeating the call
    /// keeps the first `read_at`.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns how many were unread.
    pub async fn mark_all_read(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Mark the given notifications delivered. Returns how many this call
    /// flipped; rows already delivered are not counted.
    pub async fn mark_delivered(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_delivered = true, delivered_at = NOW() \
             WHERE id = ANY($1) AND is_delivered = false",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hand claimed notifications back, e.g. when the socket went away
    /// before they were written.
    pub async fn release(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_delivered = false, delivered_at = NULL \
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
