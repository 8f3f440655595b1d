use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard;
use crate::middleware::auth::CurrentUser;
use crate::models::{Profile, Role, RoleName, UserRoleAssignment};
use crate::services::role_service;
use crate::state::AppState;
use crate::store::{decode_rows, tables, Filter, Order};

#[derive(Debug, Deserialize)]
pub struct SetUserRole {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    #[serde(default)]
    pub role: Option<String>,
}

/// Only `admin` and `member` may be assigned platform-wide through the admin
/// surface; `mod` and `owner` are subreddit-scoped.
fn parse_assignable_role(role: &str) -> Result<RoleName, ApiError> {
    match role {
        "admin" => Ok(RoleName::Admin),
        "member" => Ok(RoleName::Member),
        _ => {
            let mut details = HashMap::new();
            details.insert("role".to_string(), "role must be admin or member".to_string());
            Err(ApiError::validation_error("Invalid payload", Some(details)))
        }
    }
}

/// GET /api/admin/users - profiles with their platform role names
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Value>>, ApiError> {
    guard::require_admin(&user)?;

    let profiles: Vec<Profile> = decode_rows(
        state
            .store
            .select(
                tables::PROFILES,
                &Filter::new(),
                Some(&Order::asc("username")),
            )
            .await?,
    )?;
    let assignments: Vec<UserRoleAssignment> = decode_rows(
        state
            .store
            .select(tables::USER_ROLES, &Filter::new(), None)
            .await?,
    )?;
    let catalog: Vec<Role> = decode_rows(
        state
            .store
            .select(tables::ROLES, &Filter::new(), None)
            .await?,
    )?;

    let names_by_id: HashMap<i32, &str> = catalog
        .iter()
        .map(|role| (role.id, role.name.as_str()))
        .collect();

    let users = profiles
        .iter()
        .map(|profile| {
            let roles: Vec<&str> = assignments
                .iter()
                .filter(|a| a.user_id == profile.id)
                .filter_map(|a| names_by_id.get(&a.role_id).copied())
                .collect();
            json!({
                "id": profile.id,
                "username": profile.username,
                "roles": roles,
            })
        })
        .collect();

    Ok(Json(users))
}

/// POST /api/admin/users/:id/role - replace the user's platform roles
pub async fn set_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetUserRole>,
) -> Result<Json<Value>, ApiError> {
    guard::require_admin(&user)?;
    let role = parse_assignable_role(&payload.role)?;

    role_service::set_platform_role(state.store.as_ref(), id, role).await?;
    Ok(Json(json!({ "ok": true, "role": role })))
}

/// GET /api/admin/users/:id/role?role= - query-parameter variant kept for
/// tooling that cannot send a body
pub async fn set_role_via_query(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<Value>, ApiError> {
    guard::require_admin(&user)?;
    let role = parse_assignable_role(query.role.as_deref().unwrap_or(""))?;

    role_service::set_platform_role(state.store.as_ref(), id, role).await?;
    Ok(Json(json!({ "ok": true, "role": role })))
}
