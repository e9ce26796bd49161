//! Notification persistence (append-only, plus the read flag)

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use trashio_common::{Error, Result};
use uuid::Uuid;

use super::{parse_enum, parse_time, parse_uuid, to_db_time};
use crate::models::Notification;

pub async fn insert_notification(pool: &SqlitePool, notification: &Notification) -> Result<()> {
    let meta = serde_json::to_string(&notification.meta)
        .map_err(|e| Error::Internal(format!("Failed to serialize meta: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, message, meta, is_read, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(notification.id.to_string())
    .bind(notification.user_id.to_string())
    .bind(notification.kind.as_str())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(meta)
    .bind(notification.read)
    .bind(to_db_time(&notification.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// A user's notifications, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, kind, title, message, meta, is_read, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(notification_from_row).collect()
}

/// Mark one of `user_id`'s notifications read
pub async fn mark_read(pool: &SqlitePool, user_id: Uuid, notification_id: Uuid) -> Result<()> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(notification_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("notification {notification_id}")));
    }
    Ok(())
}

fn notification_from_row(row: &SqliteRow) -> Result<Notification> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let kind: String = row.get("kind");
    let meta: String = row.get("meta");
    let created_at: String = row.get("created_at");

    Ok(Notification {
        id: parse_uuid(&id, "id")?,
        user_id: parse_uuid(&user_id, "user_id")?,
        kind: parse_enum(&kind)?,
        title: row.get("title"),
        message: row.get("message"),
        meta: serde_json::from_str(&meta)
            .map_err(|e| Error::Internal(format!("Failed to deserialize meta: {e}")))?,
        read: row.get("is_read"),
        created_at: parse_time(&created_at, "created_at")?,
    })
}
