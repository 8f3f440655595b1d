use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Individual vote row keyed by (user, comment); value is -1 or 1, never 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentVote {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub value: i32,
}
