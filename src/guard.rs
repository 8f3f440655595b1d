//! Per-route access predicates. Every gate is evaluated fresh against the
//! store on each request; nothing here caches membership or roles.

use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::models::{Membership, SubRole};
use crate::store::{decode_row, tables, DataStore, Filter};

/// Platform-admin gate, used for global user/role management
pub fn require_admin(user: &CurrentUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admins only"))
    }
}

/// Ownership gate for posts and comments: the author may act, and so may a
/// platform admin.
pub fn require_owner_or_admin(user: &CurrentUser, author_id: Uuid) -> Result<(), ApiError> {
    if user.id == author_id || user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not allowed to modify this resource"))
    }
}

/// Fresh membership lookup for (user, subreddit). An absent row means no
/// per-subreddit role at all.
pub async fn membership_role(
    store: &dyn DataStore,
    subreddit_id: Uuid,
    user_id: Uuid,
) -> Result<Option<SubRole>, ApiError> {
    let filter = Filter::new()
        .eq("subreddit_id", subreddit_id.to_string())
        .eq("user_id", user_id.to_string());
    match store.select_one(tables::SUB_MEMBERS, &filter).await? {
        Some(row) => {
            let membership: Membership = decode_row(row)?;
            Ok(Some(membership.role))
        }
        None => Ok(None),
    }
}

/// Subreddit-role gate: allowed iff the caller holds one of `allowed` in
/// this subreddit. No membership row fails the gate.
pub async fn require_membership_role(
    store: &dyn DataStore,
    subreddit_id: Uuid,
    user: &CurrentUser,
    allowed: &[SubRole],
) -> Result<(), ApiError> {
    match membership_role(store, subreddit_id, user.id).await? {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => Err(ApiError::forbidden("Insufficient subreddit role")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleName;

    fn user_with_roles(roles: Vec<RoleName>) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: None,
            username: "tester".to_string(),
            bio: None,
            avatar_url: None,
            roles,
        }
    }

    #[test]
    fn admin_gate() {
        let admin = user_with_roles(vec![RoleName::Admin]);
        let member = user_with_roles(vec![RoleName::Member]);
        assert!(require_admin(&admin).is_ok());
        assert!(matches!(
            require_admin(&member),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn ownership_gate_accepts_author_and_admin() {
        let author = user_with_roles(vec![RoleName::Member]);
        assert!(require_owner_or_admin(&author, author.id).is_ok());

        let admin = user_with_roles(vec![RoleName::Admin]);
        assert!(require_owner_or_admin(&admin, Uuid::new_v4()).is_ok());

        let stranger = user_with_roles(vec![RoleName::Member]);
        assert!(require_owner_or_admin(&stranger, Uuid::new_v4()).is_err());
    }
}
