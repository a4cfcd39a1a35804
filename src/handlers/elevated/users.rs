use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{require_admin, AuthUser};
use crate::state::AppState;
use crate::store::users::UserFieldPatch;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/admin/users/search - substring search over email and name.
pub async fn users_search_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &auth).await?;

    let q = query.q.as_deref().map(str::trim).unwrap_or("");
    if q.is_empty() {
        return Err(ApiError::validation("Search query is required"));
    }

    let users = state.users.search(q).await?;

    Ok(Json(json!({
        "count": users.len(),
        "users": users,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateRequest {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    /// Parsed into the role enum below so an unknown value is a 400, not a
    /// silent write of garbage into the store.
    pub role: Option<String>,
}

/// PUT /api/admin/users/:uid - update any user's profile, including role.
///
/// Self-edits are rejected outright: they must go through the self-service
/// route, which cannot carry a role, so an admin can never raise or drop
/// their own privileges here.
pub async fn user_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(uid): Path<String>,
    Json(request): Json<AdminUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &auth).await?;

    if uid == auth.uid {
        return Err(ApiError::authorization(
            "You cannot edit your own profile through the admin route. Use the profile route instead.",
        ));
    }

    let role = request
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()?;

    let target = state
        .users
        .find_by_uid(&uid)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found"))?;

    let patch = UserFieldPatch {
        display_name: request.display_name,
        phone: request.phone,
        role,
    };
    let updated = state.users.update_fields(&target.id, patch).await?;
    tracing::info!(admin = %auth.uid, target = %uid, "admin updated user profile");

    state.changelog.append(&updated).await;

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": updated,
    })))
}
