use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subreddit {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-subreddit role, independent of platform-wide roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubRole {
    Owner,
    Mod,
    Member,
}

impl SubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubRole::Owner => "owner",
            SubRole::Mod => "mod",
            SubRole::Member => "member",
        }
    }
}

/// Membership row; at most one per (user, subreddit), enforced by upsert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: Uuid,
    pub subreddit_id: Uuid,
    pub role: SubRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
