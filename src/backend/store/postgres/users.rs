//! User queries

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{map_unique_violation, PgStore};
use crate::backend::store::{StoreError, UserStore};
use crate::shared::models::{NewUser, ProfileUpdate, User};

const USER_COLUMNS: &str = "id, external_uid, username, phone_number, dob, push_token, profile_picture, bio, groups, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        external_uid: row.try_get("external_uid")?,
        username: row.try_get("username")?,
        phone_number: row.try_get("phone_number")?,
        dob: row.try_get("dob")?,
        push_token: row.try_get("push_token")?,
        profile_picture: row.try_get("profile_picture")?,
        bio: row.try_get("bio")?,
        groups: row.try_get("groups")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let user = User::from_new(new);
        sqlx::query(
            r#"
            INSERT INTO users (id, external_uid, username, phone_number, dob, profile_picture, bio, groups, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, '', '', '{}', $6, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.external_uid)
        .bind(&user.username)
        .bind(&user.phone_number)
        .bind(user.dob)
        .bind(user.created_at)
        .execute(self.pool())
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_external_uid(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE external_uid = $1", USER_COLUMNS))
            .bind(uid)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE phone_number = $1", USER_COLUMNS))
            .bind(phone)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS))
            .bind(ids)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username ILIKE '%' || $1 || '%' ESCAPE '\\' ORDER BY username LIMIT $2",
            USER_COLUMNS
        ))
        .bind(escape_like(query))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                phone_number = COALESCE($3, phone_number),
                bio = COALESCE($4, bio),
                dob = COALESCE($5, dob),
                profile_picture = COALESCE($7, profile_picture),
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.username)
        .bind(&update.phone_number)
        .bind(&update.bio)
        .bind(update.dob)
        .bind(Utc::now())
        .bind(&update.profile_picture)
        .fetch_optional(self.pool())
        .await
        .map_err(map_unique_violation)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn set_push_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET push_token = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(Utc::now())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError> {
        if user_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            UPDATE users
            SET groups = array_append(groups, $1)
            WHERE id = ANY($2) AND NOT ($1 = ANY(groups))
            "#,
        )
        .bind(group_id)
        .bind(user_ids)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn remove_group_ref(&self, user_ids: &[Uuid], group_id: Uuid) -> Result<(), StoreError> {
        if user_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            UPDATE users
            SET groups = array_remove(groups, $1)
            WHERE id = ANY($2) AND $1 = ANY(groups)
            "#,
        )
        .bind(group_id)
        .bind(user_ids)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list_group_holders(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query("SELECT id FROM users WHERE $1 = ANY(groups)")
            .bind(group_id)
            .fetch_all(self.pool())
            .await?;
        rows.iter()
            .map(|row| row.try_get("id").map_err(StoreError::from))
            .collect()
    }

    async fn remove_group_ref_everywhere(&self, group_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE users SET groups = array_remove(groups, $1) WHERE $1 = ANY(groups)")
            .bind(group_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("al_ice%"), "al\\_ice\\%");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
