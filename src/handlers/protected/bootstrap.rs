use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// POST /api/bootstrap - create or get the caller's profile on first login.
///
/// Idempotent: a second call finds the existing record and returns it
/// unchanged with 200; only a genuinely new identity gets 201.
pub async fn bootstrap_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if let Some(existing) = state.users.find_by_uid(&auth.uid).await? {
        return Ok((
            StatusCode::OK,
            Json(json!({
                "message": "User already exists",
                "user": existing,
            })),
        ));
    }

    let created = state.users.create_profile(&auth.uid, &auth.email).await?;
    tracing::info!(uid = %auth.uid, email = %auth.email, "new user bootstrapped");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": created,
        })),
    ))
}
