use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{require_issue_manager, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuesQuery {
    pub include_resolved: Option<String>,
}

/// GET /api/issues - list open issues, or the full history with
/// `includeResolved=true`. Blank-title rows never show up.
pub async fn issues_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<IssuesQuery>,
) -> Result<Json<Value>, ApiError> {
    require_issue_manager(&state, &auth).await?;

    let include_resolved = query
        .include_resolved
        .as_deref()
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let issues = state.issues.list(include_resolved).await?;

    Ok(Json(json!({
        "count": issues.len(),
        "issues": issues,
    })))
}

/// PUT /api/issues/:id/resolve - mark an issue resolved.
///
/// Monotonic: resolving an already-resolved issue returns it unchanged.
pub async fn issue_resolve_put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_issue_manager(&state, &auth).await?;

    let issue = state
        .issues
        .resolve(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Issue not found"))?;
    tracing::info!(issue = %id, uid = %auth.uid, "issue resolved");

    Ok(Json(json!({
        "message": "Issue resolved",
        "issue": issue,
    })))
}
