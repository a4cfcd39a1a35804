//! Router assembly and the public root/health endpoints.

use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{response::Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{elevated, protected, public};
use crate::middleware::bearer_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Bearer-authenticated API; role gates live inside the elevated handlers
        .merge(api_routes(state.clone()))
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new().route("/api/check-email", get(public::check_email_get))
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Self-service profile lifecycle
        .route("/api/bootstrap", post(protected::bootstrap_post))
        .route(
            "/api/profile",
            get(protected::profile_get).put(protected::profile_put),
        )
        // Issue reporting (any authenticated user)
        .route("/api/issues", post(protected::issue_post).get(elevated::issues_get))
        .route("/api/issues/:id/resolve", put(elevated::issue_resolve_put))
        // Admin user management
        .route("/api/admin/users/search", get(elevated::users_search_get))
        .route("/api/admin/users/:uid", put(elevated::user_put))
        .route_layer(from_fn_with_state(state, bearer_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = crate::config::config()
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "BrightStart Portal API",
        "version": version,
        "description": "Role-based daycare administration portal backend",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "check_email": "/api/check-email (public - pre-signup)",
            "bootstrap": "POST /api/bootstrap (authenticated)",
            "profile": "GET|PUT /api/profile (authenticated)",
            "issues": "POST /api/issues (authenticated), GET /api/issues + PUT /api/issues/:id/resolve (IT or Admin)",
            "admin": "/api/admin/users/* (Admin)",
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    // A cheap filtered query doubles as a record-store reachability probe.
    match state.users.find_by_uid("__health-probe__").await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "recordStore": "ok",
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "timestamp": now,
                "recordStore": e.to_string(),
            })),
        ),
    }
}
