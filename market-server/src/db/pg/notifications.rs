use shared::models::{Notification, NotificationKind};
use shared::request::PageParams;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::db::{Page, StoreError, StoreResult};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    kind: String,
    message: String,
    payload: Json<serde_json::Value>,
    is_read: bool,
    created_at: i64,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind = NotificationKind::from_db(&row.kind)
            .ok_or_else(|| StoreError::Backend(format!("unknown notification kind: {}", row.kind)))?;
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            kind,
            message: row.message,
            payload: row.payload.0,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

pub async fn insert_batch(pool: &PgPool, batch: &[Notification]) -> StoreResult<()> {
    let mut tx = pool.begin().await?;
    for n in batch {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, kind, message, payload, is_read, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&n.id)
        .bind(&n.user_id)
        .bind(n.kind.as_db())
        .bind(&n.message)
        .bind(Json(&n.payload))
        .bind(n.is_read)
        .bind(n.created_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn list(
    pool: &PgPool,
    user_id: &str,
    unread_only: bool,
    page: PageParams,
) -> StoreResult<Page<Notification>> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;

    let rows: Vec<NotificationRow> = sqlx::query_as(
        "SELECT * FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
         ORDER BY created_at DESC, id LIMIT $3 OFFSET $4",
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(page.limit as i64)
    .bind(page.offset() as i64)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(Notification::try_from)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Page {
        items,
        total: total as u64,
    })
}

pub async fn count_unread(pool: &PgPool, user_id: &str) -> StoreResult<u64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count as u64)
}

pub async fn mark_read(pool: &PgPool, user_id: &str, id: &str) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &PgPool, user_id: &str) -> StoreResult<u64> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
