use axum::{extract::{Query, State}, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    pub email: Option<String>,
}

/// GET /api/check-email - pre-signup disambiguation.
///
/// Tells the signup page whether an address already has an account and
/// which sign-in methods it uses, so it can steer the user to login or to
/// the matching provider button.
pub async fn check_email_get(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> Result<Json<Value>, ApiError> {
    let email = query.email.as_deref().map(str::trim).unwrap_or("");
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("A valid email query parameter is required"));
    }

    let entry = state.identity.lookup_email(email).await?;

    let body = match entry {
        Some(entry) => json!({
            "exists": true,
            "authProvider": entry.primary_provider(),
            "hasPassword": entry.has_password(),
            "hasGoogle": entry.has_google(),
        }),
        None => json!({
            "exists": false,
            "authProvider": Value::Null,
            "hasPassword": false,
            "hasGoogle": false,
        }),
    };

    Ok(Json(body))
}
