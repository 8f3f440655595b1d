use serde_json::json;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::models::{Profile, Role, RoleName, UserRoleAssignment};
use crate::store::{decode_row, decode_rows, tables, DataStore, Filter, StoreError};

/// Resolve a verified identity into a full user context, once per request.
///
/// A verified token with no matching profile is not a valid session, so any
/// failure of the profile lookup maps to Unauthorized. Role resolution
/// degrades gracefully: it never fails the request.
pub async fn resolve_user(
    store: &dyn DataStore,
    identity: &Identity,
) -> Result<CurrentUser, ApiError> {
    let filter = Filter::new().eq("id", identity.id.to_string());
    let profile: Profile = match store.select_one(tables::PROFILES, &filter).await {
        Ok(Some(row)) => decode_row(row).map_err(|e| {
            tracing::error!("Profile row for {} failed to decode: {}", identity.id, e);
            ApiError::unauthorized("User not found")
        })?,
        Ok(None) => return Err(ApiError::unauthorized("User not found")),
        Err(e) => {
            tracing::error!("Profile lookup for {} failed: {}", identity.id, e);
            return Err(ApiError::unauthorized("User not found"));
        }
    };

    let roles = resolve_roles(store, identity.id).await;

    Ok(CurrentUser {
        id: profile.id,
        email: identity.email.clone(),
        username: profile.username,
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        roles,
    })
}

/// Determine the user's platform-wide roles; never empty. Users with zero
/// assignments get `member`, and the default is persisted best-effort so the
/// next request finds an assignment row.
pub async fn resolve_roles(store: &dyn DataStore, user_id: Uuid) -> Vec<RoleName> {
    match assigned_roles(store, user_id).await {
        Ok(roles) if !roles.is_empty() => roles,
        Ok(_) => {
            ensure_default_role(store, user_id).await;
            vec![RoleName::Member]
        }
        Err(e) => {
            tracing::warn!("Role lookup for {} failed, defaulting to member: {}", user_id, e);
            vec![RoleName::Member]
        }
    }
}

/// Assignments joined against the role catalog; unrecognized role names are
/// dropped rather than errored.
async fn assigned_roles(
    store: &dyn DataStore,
    user_id: Uuid,
) -> Result<Vec<RoleName>, StoreError> {
    let filter = Filter::new().eq("user_id", user_id.to_string());
    let assignments: Vec<UserRoleAssignment> =
        decode_rows(store.select(tables::USER_ROLES, &filter, None).await?)?;
    if assignments.is_empty() {
        return Ok(vec![]);
    }

    let catalog: Vec<Role> = decode_rows(store.select(tables::ROLES, &Filter::new(), None).await?)?;

    let mut roles = Vec::new();
    for assignment in assignments {
        let name = catalog
            .iter()
            .find(|role| role.id == assignment.role_id)
            .and_then(|role| role.name.parse::<RoleName>().ok());
        if let Some(name) = name {
            if !roles.contains(&name) {
                roles.push(name);
            }
        }
    }
    Ok(roles)
}

/// Persist the default `member` assignment for a user first seen with no
/// roles. Best-effort: failure leaves the in-memory default in place and
/// never alters the primary response. Upsert keeps this idempotent under
/// concurrent first requests.
pub async fn ensure_default_role(store: &dyn DataStore, user_id: Uuid) {
    let result = async {
        let filter = Filter::new().eq("name", RoleName::Member.as_str());
        let row = store
            .select_one(tables::ROLES, &filter)
            .await?
            .ok_or_else(|| StoreError::NotFound("member role missing from catalog".to_string()))?;
        let member: Role = decode_row(row)?;

        store
            .upsert(
                tables::USER_ROLES,
                json!({ "user_id": user_id, "role_id": member.id }),
                &["user_id", "role_id"],
            )
            .await?;
        Ok::<(), StoreError>(())
    }
    .await;

    if let Err(e) = result {
        tracing::warn!("Could not persist default member role for {}: {}", user_id, e);
    }
}

/// Replace a user's platform role assignments with a single role. Used by
/// the admin endpoints; role must exist in the catalog.
pub async fn set_platform_role(
    store: &dyn DataStore,
    user_id: Uuid,
    role: RoleName,
) -> Result<(), ApiError> {
    let filter = Filter::new().eq("name", role.as_str());
    let row = store
        .select_one(tables::ROLES, &filter)
        .await?
        .ok_or_else(|| ApiError::bad_request("Role not found"))?;
    let role_row: Role = decode_row(row)?;

    let user_filter = Filter::new().eq("user_id", user_id.to_string());
    store.delete(tables::USER_ROLES, &user_filter).await?;
    store
        .insert(
            tables::USER_ROLES,
            json!({ "user_id": user_id, "role_id": role_row.id }),
        )
        .await?;

    Ok(())
}
