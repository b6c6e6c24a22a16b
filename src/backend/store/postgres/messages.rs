//! Group chat message queries

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::PgStore;
use crate::backend::store::{MessageStore, StoreError};
use crate::shared::models::{GroupMessage, NewGroupMessage};

const MESSAGE_COLUMNS: &str = "id, group_id, sender_id, sender_name, sender_avatar_url, text, created_at";

fn message_from_row(row: &PgRow) -> Result<GroupMessage, StoreError> {
    Ok(GroupMessage {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        sender_id: row.try_get("sender_id")?,
        sender_name: row.try_get("sender_name")?,
        sender_avatar_url: row.try_get("sender_avatar_url")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MessageStore for PgStore {
    async fn create(&self, new: NewGroupMessage) -> Result<GroupMessage, StoreError> {
        let message = GroupMessage::from_new(new);
        sqlx::query(
            r#"
            INSERT INTO group_messages (id, group_id, sender_id, sender_name, sender_avatar_url, text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id)
        .bind(message.group_id)
        .bind(message.sender_id)
        .bind(&message.sender_name)
        .bind(&message.sender_avatar_url)
        .bind(&message.text)
        .bind(message.created_at)
        .execute(self.pool())
        .await?;
        Ok(message)
    }

    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<GroupMessage>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM group_messages WHERE group_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(message_from_row).collect()
    }

    async fn find_in_group(&self, group_id: Uuid, message_id: Uuid) -> Result<Option<GroupMessage>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM group_messages WHERE id = $1 AND group_id = $2",
            MESSAGE_COLUMNS
        ))
        .bind(message_id)
        .bind(group_id)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(message_from_row).transpose()
    }

    async fn delete(&self, message_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM group_messages WHERE id = $1")
            .bind(message_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
