//! Post queries

use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, Row};
use uuid::Uuid;

use super::PgStore;
use crate::backend::store::{Page, PostFilter, PostStore, StoreError};
use crate::shared::models::{Comment, MediaType, NewPost, Post};

const POST_COLUMNS: &str = "id, user_id, group_id, caption, media_url, media_type, likes, comments, created_at";

fn post_from_row(row: &PgRow) -> Result<Post, StoreError> {
    let media_type: String = row.try_get("media_type")?;
    let Json(comments): Json<Vec<Comment>> = row.try_get("comments")?;
    Ok(Post {
        id: row.try_get("id")?,
        user: row.try_get("user_id")?,
        group: row.try_get("group_id")?,
        caption: row.try_get("caption")?,
        media_url: row.try_get("media_url")?,
        media_type: media_type
            .parse::<MediaType>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        likes: row.try_get("likes")?,
        comments,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PostStore for PgStore {
    async fn create(&self, new: NewPost) -> Result<Post, StoreError> {
        let post = Post::from_new(new);
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, group_id, caption, media_url, media_type, likes, comments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, '{}', '[]', $7)
            "#,
        )
        .bind(post.id)
        .bind(post.user)
        .bind(post.group)
        .bind(&post.caption)
        .bind(&post.media_url)
        .bind(post.media_type.as_str())
        .bind(post.created_at)
        .execute(self.pool())
        .await?;
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn list(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError> {
        let select = |clause: &str| {
            format!(
                "SELECT {} FROM posts WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                POST_COLUMNS, clause
            )
        };
        let rows = match filter {
            PostFilter::Group(group) => {
                sqlx::query(&select("group_id = $1"))
                    .bind(*group)
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(self.pool())
                    .await?
            }
            PostFilter::Groups(groups) => {
                sqlx::query(&select("group_id = ANY($1)"))
                    .bind(groups)
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(self.pool())
                    .await?
            }
            PostFilter::Author(author) => {
                sqlx::query(&select("user_id = $1"))
                    .bind(*author)
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(self.pool())
                    .await?
            }
        };
        rows.iter().map(post_from_row).collect()
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Vec<Uuid>>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET likes = CASE
                WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                ELSE array_append(likes, $2)
            END
            WHERE id = $1
            RETURNING likes
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| r.try_get("likes")).transpose()?)
    }

    async fn add_comment(&self, post_id: Uuid, comment: Comment) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query("UPDATE posts SET comments = comments || $2 WHERE id = $1 RETURNING id")
            .bind(post_id)
            .bind(Json(vec![comment.clone()]))
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|_| comment))
    }
}
