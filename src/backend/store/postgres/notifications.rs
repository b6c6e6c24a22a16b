//! Notification queries

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::PgStore;
use crate::backend::store::{NotificationStore, StoreError};
use crate::shared::models::{NewNotification, Notification, NotificationKind};

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, post_id, group_id, from_user, message, read, created_at";

fn notification_from_row(row: &PgRow) -> Result<Notification, StoreError> {
    let kind: String = row.try_get("kind")?;
    Ok(Notification {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        kind: kind
            .parse::<NotificationKind>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        post: row.try_get("post_id")?,
        group: row.try_get("group_id")?,
        from_user: row.try_get("from_user")?,
        message: row.try_get("message")?,
        read: row.try_get("read")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let notification = Notification::from_new(new);
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, post_id, group_id, from_user, message, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user)
        .bind(notification.kind.as_str())
        .bind(notification.post)
        .bind(notification.group)
        .bind(notification.from_user)
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(self.pool())
        .await?;
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
