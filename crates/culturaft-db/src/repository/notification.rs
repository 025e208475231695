//! # Notification Repository
//!
//! Admin feed storage. Writes happen as side effects of checkout and status
//! changes; callers treat a failed write as a warning, never as a failure of
//! the operation that caused it.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use culturaft_core::{Notification, NotificationDraft, NotificationKind, DEFAULT_NOTIFICATION_LIMIT};

#[derive(Debug, Clone, sqlx::FromRow)]
struct NotificationRow {
    id: String,
    kind: NotificationKind,
    data: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DbError;

    fn try_from(row: NotificationRow) -> DbResult<Self> {
        let data = serde_json::from_str(&row.data)
            .map_err(|e| DbError::corrupt("notifications.data", &row.id, e))?;

        Ok(Notification {
            id: row.id,
            kind: row.kind,
            data,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// Repository for admin notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Writes a notification on its own connection.
    pub async fn emit(&self, draft: &NotificationDraft) -> DbResult<Notification> {
        let mut conn = self.pool.acquire().await?;
        Self::emit_on(&mut conn, draft).await
    }

    /// Writes a notification on an existing connection or transaction.
    ///
    /// Checkout calls this inside a savepoint so that a failure here can be
    /// rolled back without touching the order.
    pub async fn emit_on(
        conn: &mut SqliteConnection,
        draft: &NotificationDraft,
    ) -> DbResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind: draft.kind,
            data: draft.data.clone(),
            read: false,
            created_at: Utc::now(),
        };

        debug!(id = %notification.id, kind = %notification.kind, "Emitting notification");

        let data = serde_json::to_string(&notification.data)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, kind, data, read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&notification.id)
        .bind(notification.kind)
        .bind(data)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(notification)
    }

    /// Newest notifications first.
    ///
    /// `None` uses [`DEFAULT_NOTIFICATION_LIMIT`].
    pub async fn recent(&self, limit: Option<i64>) -> DbResult<Vec<Notification>> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT);

        debug!(limit = %limit, "Listing notifications");

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, kind, data, read, created_at
            FROM notifications
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    pub async fn mark_read(&self, id: &str) -> DbResult<Notification> {
        debug!(id = %id, "Marking notification read");

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications SET read = 1
            WHERE id = ?1
            RETURNING id, kind, data, read, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Notification", id))?;

        Notification::try_from(row)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
