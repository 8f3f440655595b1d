use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard;
use crate::middleware::auth::CurrentUser;
use crate::models::{Membership, SubRole, Subreddit};
use crate::state::AppState;
use crate::store::{decode_row, decode_rows, tables, Filter, Order};
use crate::validate::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct CreateSubreddit {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

impl CreateSubreddit {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check_len("name", &self.name, 3, 50);
        if let Some(description) = &self.description {
            errors.check_len("description", description, 0, 300);
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubreddit {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

impl UpdateSubreddit {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(description) = &self.description {
            errors.check_len("description", description, 0, 300);
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct SetMemberRole {
    pub role: String,
}

/// GET /api/subreddits - newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Subreddit>>, ApiError> {
    let rows = state
        .store
        .select(
            tables::SUBREDDITS,
            &Filter::new(),
            Some(&Order::desc("created_at")),
        )
        .await?;
    Ok(Json(decode_rows(rows)?))
}

/// POST /api/subreddits - create; the creator becomes the owner member
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateSubreddit>,
) -> Result<Json<Subreddit>, ApiError> {
    payload.validate()?;

    let row = state
        .store
        .insert(
            tables::SUBREDDITS,
            json!({
                "name": payload.name,
                "description": payload.description,
                "is_private": payload.is_private.unwrap_or(false),
            }),
        )
        .await?;
    let subreddit: Subreddit = decode_row(row)?;

    state
        .store
        .upsert(
            tables::SUB_MEMBERS,
            json!({
                "user_id": user.id,
                "subreddit_id": subreddit.id,
                "role": SubRole::Owner.as_str(),
            }),
            &["user_id", "subreddit_id"],
        )
        .await?;

    Ok(Json(subreddit))
}

/// GET /api/subreddits/slug/:name
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Subreddit>, ApiError> {
    let filter = Filter::new().eq("name", name);
    let row = state
        .store
        .select_one(tables::SUBREDDITS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("Subreddit not found"))?;
    Ok(Json(decode_row(row)?))
}

/// GET /api/subreddits/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subreddit>, ApiError> {
    let filter = Filter::new().eq("id", id.to_string());
    let row = state
        .store
        .select_one(tables::SUBREDDITS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("Subreddit not found"))?;
    Ok(Json(decode_row(row)?))
}

/// PUT /api/subreddits/:id - owner only
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubreddit>,
) -> Result<Json<Subreddit>, ApiError> {
    payload.validate()?;
    guard::require_membership_role(state.store.as_ref(), id, &user, &[SubRole::Owner]).await?;

    let mut patch = Map::new();
    if let Some(description) = payload.description {
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(is_private) = payload.is_private {
        patch.insert("is_private".to_string(), json!(is_private));
    }
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let filter = Filter::new().eq("id", id.to_string());
    let row = state
        .store
        .update(tables::SUBREDDITS, &filter, Value::Object(patch))
        .await?
        .ok_or_else(|| ApiError::not_found("Subreddit not found"))?;
    Ok(Json(decode_row(row)?))
}

/// DELETE /api/subreddits/:id - owner, or platform admin
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !user.is_admin() {
        guard::require_membership_role(state.store.as_ref(), id, &user, &[SubRole::Owner]).await?;
    }

    let filter = Filter::new().eq("id", id.to_string());
    let deleted = state.store.delete(tables::SUBREDDITS, &filter).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Subreddit not found"));
    }
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/subreddits/:id/join - idempotent; role is overwritten on repeat
pub async fn join(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .upsert(
            tables::SUB_MEMBERS,
            json!({
                "user_id": user.id,
                "subreddit_id": id,
                "role": SubRole::Member.as_str(),
            }),
            &["user_id", "subreddit_id"],
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/subreddits/:id/leave
pub async fn leave(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new()
        .eq("subreddit_id", id.to_string())
        .eq("user_id", user.id.to_string());
    state.store.delete(tables::SUB_MEMBERS, &filter).await?;
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/subreddits/:id/members - owner or mod only
pub async fn members(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Membership>>, ApiError> {
    guard::require_membership_role(
        state.store.as_ref(),
        id,
        &user,
        &[SubRole::Owner, SubRole::Mod],
    )
    .await?;

    let filter = Filter::new().eq("subreddit_id", id.to_string());
    let rows = state
        .store
        .select(tables::SUB_MEMBERS, &filter, Some(&Order::asc("created_at")))
        .await?;
    Ok(Json(decode_rows(rows)?))
}

/// POST /api/subreddits/:id/members/:user_id/role - owner only;
/// target role is limited to member or mod (ownership never transfers here)
pub async fn set_member_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetMemberRole>,
) -> Result<Json<Value>, ApiError> {
    let role = match payload.role.as_str() {
        "member" => SubRole::Member,
        "mod" => SubRole::Mod,
        _ => {
            let mut details = std::collections::HashMap::new();
            details.insert("role".to_string(), "role must be member or mod".to_string());
            return Err(ApiError::validation_error("Invalid payload", Some(details)));
        }
    };

    guard::require_membership_role(state.store.as_ref(), id, &user, &[SubRole::Owner]).await?;

    state
        .store
        .upsert(
            tables::SUB_MEMBERS,
            json!({
                "user_id": member_id,
                "subreddit_id": id,
                "role": role.as_str(),
            }),
            &["user_id", "subreddit_id"],
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}
