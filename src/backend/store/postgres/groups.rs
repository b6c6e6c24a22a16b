//! Group queries

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::PgStore;
use crate::backend::store::{GroupStore, StoreError};
use crate::shared::models::{Group, NewGroup};

const GROUP_COLUMNS: &str = "id, name, description, admin, members, created_at, updated_at";

fn group_from_row(row: &PgRow) -> Result<Group, StoreError> {
    Ok(Group {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        admin: row.try_get("admin")?,
        members: row.try_get("members")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl GroupStore for PgStore {
    async fn create(&self, new: NewGroup) -> Result<Group, StoreError> {
        let group = Group::from_new(new);
        sqlx::query(
            r#"
            INSERT INTO groups (id, name, description, admin, members, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.admin)
        .bind(&group.members)
        .bind(group.created_at)
        .execute(self.pool())
        .await?;
        Ok(group)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM groups WHERE id = $1", GROUP_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(group_from_row).transpose()
    }

    async fn list_for_member(&self, user_id: Uuid) -> Result<Vec<Group>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM groups WHERE $1 = ANY(members) ORDER BY created_at",
            GROUP_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(group_from_row).collect()
    }

    async fn replace(&self, id: Uuid, name: &str, members: &[Uuid]) -> Result<Option<Group>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE groups SET name = $2, members = $3, updated_at = $4 WHERE id = $1 RETURNING {}",
            GROUP_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(members)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(group_from_row).transpose()
    }

    async fn add_members(&self, id: Uuid, members: &[Uuid]) -> Result<Option<Group>, StoreError> {
        // Single statement, so concurrent joins cannot drop each other's additions
        let row = sqlx::query(&format!(
            r#"
            UPDATE groups
            SET members = members || ARRAY(
                    SELECT DISTINCT m FROM unnest($2::uuid[]) AS m WHERE NOT (m = ANY(members))
                ),
                updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(id)
        .bind(members)
        .bind(Utc::now())
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(group_from_row).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
