use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{extract_bearer, verify_token};
use crate::error::ApiError;
use crate::models::RoleName;
use crate::services::role_service;
use crate::state::AppState;

/// Authenticated user context: token claims merged with the stored profile
/// and the resolved platform role set. Request-scoped; never cached.
#[derive(Clone, Debug, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub roles: Vec<RoleName>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&RoleName::Admin)
    }
}

/// Authentication middleware: verifies the bearer credential, resolves the
/// caller's profile and platform roles, and injects [`CurrentUser`] into the
/// request extensions for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(ApiError::unauthorized)?;

    let identity = verify_token(&token, &state.config.security.jwt_secret)
        .map_err(ApiError::unauthorized)?;

    let user = role_service::resolve_user(state.store.as_ref(), &identity).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
