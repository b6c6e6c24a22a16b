//! Post request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::models::Comment;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub group_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListPostsQuery {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// A stored comment plus the commenter's handle
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    #[serde(flatten)]
    pub comment: Comment,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikesResponse {
    pub likes: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(ListPostsQuery::default().limit(), 20);
        let query = ListPostsQuery { limit: Some(500), ..Default::default() };
        assert_eq!(query.limit(), 50);
        let query = ListPostsQuery { limit: Some(0), page: Some(0), ..Default::default() };
        assert_eq!(query.limit(), 1);
        assert_eq!(query.page(), 1);
    }
}
