use axum::{extract::State, response::Json, Extension};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::store::users::UserFieldPatch;
use crate::types::ProfileUpdate;

/// GET /api/profile - the caller's own profile.
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let profile = state
        .users
        .find_by_uid(&auth.uid)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found"))?;

    Ok(Json(json!({ "user": profile })))
}

/// PUT /api/profile - self-service update of display name and phone.
///
/// The payload type has no role field, so a role smuggled into the request
/// body is dropped during deserialization and can never reach the store.
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    let existing = state
        .users
        .find_by_uid(&auth.uid)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found"))?;

    let patch = UserFieldPatch {
        display_name: update.display_name,
        phone: update.phone,
        role: None,
    };
    let updated = state.users.update_fields(&existing.id, patch).await?;

    state.changelog.append(&updated).await;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": updated,
    })))
}
