use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard;
use crate::middleware::auth::CurrentUser;
use crate::models::{Post, PostType};
use crate::services::vote_service::{self, VoteTarget};
use crate::state::AppState;
use crate::store::{decode_row, decode_rows, tables, Filter, Order};
use crate::validate::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub post_type: PostType,
    #[serde(default)]
    pub media_urls: Option<Vec<String>>,
}

impl CreatePost {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check_len("title", &self.title, 3, 200);
        errors.check_len("content", &self.content, 1, 2000);
        if let Some(urls) = &self.media_urls {
            for url in urls {
                errors.check_url("media_urls", url);
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i32,
}

impl VoteRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if ![-1, 0, 1].contains(&self.value) {
            errors.push("value", "value must be -1, 0 or 1");
        }
        errors.into_result()
    }
}

/// GET /api/posts - global feed, newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let rows = state
        .store
        .select(
            tables::POSTS,
            &Filter::new(),
            Some(&Order::desc("created_at")),
        )
        .await?;
    Ok(Json(decode_rows(rows)?))
}

/// GET /api/posts/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let filter = Filter::new().eq("id", id.to_string());
    let row = state
        .store
        .select_one(tables::POSTS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(decode_row(row)?))
}

/// GET /api/subreddits/:id/posts - newest first
pub async fn list_for_subreddit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let filter = Filter::new().eq("subreddit_id", id.to_string());
    let rows = state
        .store
        .select(tables::POSTS, &filter, Some(&Order::desc("created_at")))
        .await?;
    Ok(Json(decode_rows(rows)?))
}

/// POST /api/subreddits/:id/posts
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePost>,
) -> Result<Json<Post>, ApiError> {
    payload.validate()?;

    let row = state
        .store
        .insert(
            tables::POSTS,
            json!({
                "subreddit_id": id,
                "author_id": user.id,
                "title": payload.title,
                "content": payload.content,
                "type": payload.post_type,
                "media_urls": payload.media_urls,
            }),
        )
        .await?;
    Ok(Json(decode_row(row)?))
}

/// DELETE /api/posts/:id - author or platform admin
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new().eq("id", id.to_string());
    let row = state
        .store
        .select_one(tables::POSTS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    let post: Post = decode_row(row)?;

    guard::require_owner_or_admin(&user, post.author_id)?;

    state.store.delete(tables::POSTS, &filter).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/posts/:id/vote
pub async fn vote(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    payload.validate()?;

    let score =
        vote_service::cast_vote(state.store.as_ref(), &VoteTarget::post(id), user.id, payload.value)
            .await?;
    Ok(Json(json!({ "ok": true, "score": score })))
}
