use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitIssueRequest {
    pub issue: Option<String>,
    pub description: Option<String>,
}

/// POST /api/issues - submit a support ticket.
///
/// Any authenticated user may report. The reporter's identity is appended
/// to the description server-side so IT sees who filed it even though the
/// issue row itself carries no user link.
pub async fn issue_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<SubmitIssueRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let title = request.issue.as_deref().map(str::trim).unwrap_or("");
    let description = request.description.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::validation("Both issue and description are required"));
    }

    let reporter = state.users.find_by_uid(&auth.uid).await?;
    let reporter_name = match &reporter {
        Some(profile) if !profile.display_name.is_empty() => profile.display_name.clone(),
        _ => auth.email.clone(),
    };
    let description = format!(
        "{}\n\nReported by: {} ({})",
        description, reporter_name, auth.email
    );

    let created = state.issues.create(title, &description).await?;
    tracing::info!(issue = %created.id, uid = %auth.uid, "issue submitted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Issue submitted successfully",
            "issue": created,
        })),
    ))
}
