use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Link,
    Image,
}

impl Default for PostType {
    fn default() -> Self {
        PostType::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub subreddit_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub post_type: PostType,
    #[serde(default)]
    pub media_urls: Option<Vec<String>>,
    /// Denormalized sum of this post's vote values, recomputed on every vote
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Individual vote row keyed by (user, post); value is -1 or 1, never 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostVote {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub value: i32,
}
