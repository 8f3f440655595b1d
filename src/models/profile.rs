use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user profile row, created by the auth platform on signup.
/// 1:1 with the token subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
