use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard;
use crate::handlers::posts::VoteRequest;
use crate::middleware::auth::CurrentUser;
use crate::models::Comment;
use crate::services::vote_service::{self, VoteTarget};
use crate::state::AppState;
use crate::store::{decode_row, decode_rows, tables, Filter, Order};
use crate::validate::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl CreateComment {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check_len("content", &self.content, 1, 1000);
        errors.into_result()
    }
}

/// GET /api/posts/:id/comments - oldest first
pub async fn list_for_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let filter = Filter::new().eq("post_id", id.to_string());
    let rows = state
        .store
        .select(tables::COMMENTS, &filter, Some(&Order::asc("created_at")))
        .await?;
    Ok(Json(decode_rows(rows)?))
}

/// POST /api/posts/:id/comments
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateComment>,
) -> Result<Json<Comment>, ApiError> {
    payload.validate()?;

    let row = state
        .store
        .insert(
            tables::COMMENTS,
            json!({
                "post_id": id,
                "author_id": user.id,
                "content": payload.content,
                "parent_id": payload.parent_id,
            }),
        )
        .await?;
    Ok(Json(decode_row(row)?))
}

/// DELETE /api/comments/:id - author or platform admin
pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let filter = Filter::new().eq("id", id.to_string());
    let row = state
        .store
        .select_one(tables::COMMENTS, &filter)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    let comment: Comment = decode_row(row)?;

    guard::require_owner_or_admin(&user, comment.author_id)?;

    state.store.delete(tables::COMMENTS, &filter).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/comments/:id/vote
pub async fn vote(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    payload.validate()?;

    let score = vote_service::cast_vote(
        state.store.as_ref(),
        &VoteTarget::comment(id),
        user.id,
        payload.value,
    )
    .await?;
    Ok(Json(json!({ "ok": true, "score": score })))
}
