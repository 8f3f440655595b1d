use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::models::Profile;
use crate::state::AppState;
use crate::store::{decode_row, tables, Filter};
use crate::validate::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UpdateProfile {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(username) = &self.username {
            errors.check_len("username", username, 3, 50);
        }
        if let Some(bio) = &self.bio {
            errors.check_len("bio", bio, 0, 300);
        }
        if let Some(avatar_url) = &self.avatar_url {
            errors.check_url("avatar_url", avatar_url);
            errors.check_len("avatar_url", avatar_url, 0, 300);
        }
        errors.into_result()
    }
}

/// GET /api/auth/me - the resolved identity for this request
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// PUT /api/auth/me - update the caller's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfile>,
) -> Result<Json<Value>, ApiError> {
    payload.validate()?;

    let mut patch = Map::new();
    if let Some(username) = payload.username {
        patch.insert("username".to_string(), json!(username));
    }
    if let Some(bio) = payload.bio {
        patch.insert("bio".to_string(), json!(bio));
    }
    if let Some(avatar_url) = payload.avatar_url {
        patch.insert("avatar_url".to_string(), json!(avatar_url));
    }
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let filter = Filter::new().eq("id", user.id.to_string());
    let row = state
        .store
        .update(tables::PROFILES, &filter, Value::Object(patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    let profile: Profile = decode_row(row)?;

    Ok(Json(json!({ "user": profile })))
}
