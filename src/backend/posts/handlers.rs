//! Post HTTP Handlers
//!
//! Routes:
//! - `POST /api/posts` (multipart: `media`, `groupId`, `caption`)
//! - `GET /api/posts?groupId=&page=&limit=`
//! - `POST /api/posts/{postId}/like`
//! - `POST /api/posts/{postId}/comments`
//! - `GET /api/users/posts?page=&limit=`

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use super::types::{CommentRequest, CommentResponse, LikesResponse, ListPostsQuery};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::auth::AuthUser;
use crate::backend::notifications::FanoutJob;
use crate::backend::server::state::AppState;
use crate::backend::store::{Page, PostFilter};
use crate::shared::models::{Comment, MediaType, NewPost, Post};

struct Upload {
    data: Bytes,
    content_type: String,
    file_name: Option<String>,
}

/// File extension for a stored upload: the client file name's, else the MIME subtype
pub fn media_extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    let from_type = || {
        content_type
            .split_once('/')
            .map(|(_, sub)| sub.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
    };
    from_name.or_else(from_type).unwrap_or_else(|| "bin".to_string())
}

/// Unique blob key under `prefix`: `<prefix>/<millis>-<random>.<ext>`
pub fn upload_key(prefix: &str, file_name: Option<&str>, content_type: &str) -> String {
    format!(
        "{}/{}-{}.{}",
        prefix,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        media_extension(file_name, content_type)
    )
}

async fn load_post(state: &AppState, post_id: Uuid) -> BackendResult<Post> {
    state
        .repos
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Post"))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> BackendError {
    BackendError::validation("media", format!("Malformed upload: {}", e))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> BackendResult<(StatusCode, Json<Post>)> {
    let mut upload = None;
    let mut group_id = None;
    let mut caption = String::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("media") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload {
                    data,
                    content_type,
                    file_name,
                });
            }
            Some("groupId") => group_id = Some(field.text().await.map_err(multipart_error)?),
            Some("caption") => caption = field.text().await.map_err(multipart_error)?,
            _ => {}
        }
    }

    let (upload, group_id) = match (upload, group_id) {
        (Some(upload), Some(group_id)) if !upload.data.is_empty() => (upload, group_id),
        _ => return Err(BackendError::validation("media", "Missing media or groupId")),
    };
    let group_id = Uuid::parse_str(group_id.trim())
        .map_err(|_| BackendError::validation("groupId", "Invalid groupId"))?;

    let group = state.membership.require_member(group_id, user.id).await?;

    let key = upload_key(
        &format!("posts/{}", user.id),
        upload.file_name.as_deref(),
        &upload.content_type,
    );
    let media_url = state
        .blobs
        .put(&key, upload.data, &upload.content_type)
        .await?;

    let created = state
        .repos
        .posts
        .create(NewPost {
            user: user.id,
            group: group.id,
            caption: caption.trim().to_string(),
            media_url,
            media_type: MediaType::from_content_type(&upload.content_type),
        })
        .await;
    let post = match created {
        Ok(post) => post,
        Err(e) => {
            if let Err(cleanup) = state.blobs.delete(&key).await {
                tracing::warn!("Orphaned upload {} after failed post insert: {}", key, cleanup);
            }
            return Err(e.into());
        }
    };
    tracing::info!("Post {} created by {} in group {}", post.id, user.id, group.id);

    state.fanout.submit(FanoutJob::NewPost {
        post_id: post.id,
        group_id: group.id,
        author_id: user.id,
        caption: post.caption.clone(),
    });

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/users/posts
///
/// The caller's own posts across every group, newest first.
pub async fn list_own_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListPostsQuery>,
) -> BackendResult<Json<Vec<Post>>> {
    let posts = state
        .repos
        .posts
        .list(&PostFilter::Author(user.id), Page::new(query.page(), query.limit()))
        .await?;
    Ok(Json(posts))
}

/// GET /api/posts
///
/// With `groupId` the caller must belong to that group; without it the
/// feed covers every group the caller belongs to.
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListPostsQuery>,
) -> BackendResult<Json<Vec<Post>>> {
    let filter = match query.group_id {
        Some(group_id) => {
            state.membership.require_member(group_id, user.id).await?;
            PostFilter::Group(group_id)
        }
        None => {
            let groups: Vec<Uuid> = state
                .membership
                .list_for_user(user.id)
                .await?
                .into_iter()
                .map(|g| g.id)
                .collect();
            if groups.is_empty() {
                return Ok(Json(Vec::new()));
            }
            PostFilter::Groups(groups)
        }
    };

    let posts = state
        .repos
        .posts
        .list(&filter, Page::new(query.page(), query.limit()))
        .await?;
    Ok(Json(posts))
}

/// POST /api/posts/{postId}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> BackendResult<Json<LikesResponse>> {
    let post = load_post(&state, post_id).await?;
    state.membership.require_member(post.group, user.id).await?;

    let likes = state
        .repos
        .posts
        .toggle_like(post.id, user.id)
        .await?
        .ok_or_else(|| BackendError::not_found("Post"))?;
    Ok(Json(LikesResponse { likes }))
}

/// POST /api/posts/{postId}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
    Json(request): Json<CommentRequest>,
) -> BackendResult<(StatusCode, Json<CommentResponse>)> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(BackendError::validation("text", "Comment text missing"));
    }

    let post = load_post(&state, post_id).await?;
    state.membership.require_member(post.group, user.id).await?;

    let comment = state
        .repos
        .posts
        .add_comment(post.id, Comment::new(user.id, text))
        .await?
        .ok_or_else(|| BackendError::not_found("Post"))?;

    if post.user != user.id {
        state.fanout.submit(FanoutJob::Comment {
            post_id: post.id,
            post_author_id: post.user,
            commenter_id: user.id,
            commenter_name: user.username.clone(),
            text: comment.text.clone(),
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            comment,
            username: user.username,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_extension() {
        assert_eq!(media_extension(Some("IMG_1.JPG"), "image/jpeg"), "jpg");
        assert_eq!(media_extension(None, "video/mp4"), "mp4");
        assert_eq!(media_extension(Some("noext"), "image/png"), "png");
        assert_eq!(media_extension(None, "image/svg+xml"), "bin");
        assert_eq!(media_extension(None, "garbage"), "bin");
    }
}
