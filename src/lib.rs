use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod validate;

#[cfg(test)]
pub mod testing;

use state::AppState;

/// Build the full application router. Protected routes sit behind the JWT
/// auth middleware; listing and read-only detail routes are public.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    public_routes()
        .merge(protected_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/subreddits", get(handlers::subreddits::list))
        .route("/api/subreddits/slug/:name", get(handlers::subreddits::get_by_slug))
        .route("/api/subreddits/:id", get(handlers::subreddits::get))
        .route("/api/subreddits/:id/posts", get(handlers::posts::list_for_subreddit))
        .route("/api/posts", get(handlers::posts::list))
        .route("/api/posts/:id", get(handlers::posts::get))
        .route("/api/posts/:id/comments", get(handlers::comments::list_for_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Current user
        .route("/api/auth/me", get(handlers::auth::me).put(handlers::auth::update_me))
        // Subreddit management
        .route("/api/subreddits", post(handlers::subreddits::create))
        .route(
            "/api/subreddits/:id",
            put(handlers::subreddits::update).delete(handlers::subreddits::remove),
        )
        .route("/api/subreddits/:id/join", post(handlers::subreddits::join))
        .route("/api/subreddits/:id/leave", post(handlers::subreddits::leave))
        .route("/api/subreddits/:id/members", get(handlers::subreddits::members))
        .route(
            "/api/subreddits/:id/members/:user_id/role",
            post(handlers::subreddits::set_member_role),
        )
        // Content
        .route("/api/subreddits/:id/posts", post(handlers::posts::create))
        .route("/api/posts/:id", delete(handlers::posts::remove))
        .route("/api/posts/:id/vote", post(handlers::posts::vote))
        .route("/api/posts/:id/comments", post(handlers::comments::create))
        .route("/api/comments/:id", delete(handlers::comments::remove))
        .route("/api/comments/:id/vote", post(handlers::comments::vote))
        // Admin
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/:id/role",
            post(handlers::admin::set_role).get(handlers::admin::set_role_via_query),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "thredd API",
        "version": version,
        "description": "Reddit-style community API built with Rust (Axum)",
        "endpoints": {
            "subreddits": "/api/subreddits[/:id] (list/detail public, mutation protected)",
            "posts": "/api/posts[/:id], /api/subreddits/:id/posts, /api/posts/:id/vote",
            "comments": "/api/posts/:id/comments, /api/comments/:id[/vote]",
            "auth": "/api/auth/me (protected)",
            "admin": "/api/admin/users* (admin only)",
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok",
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "store_error": e.to_string(),
            })),
        ),
    }
}
