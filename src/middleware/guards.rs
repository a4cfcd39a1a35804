//! Role gates for the elevated routes.
//!
//! Evaluated after token authentication: the caller's role comes from their
//! stored profile, never from the token, so a role change takes effect on
//! the next request.

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;
use crate::types::{Role, UserProfile};

async fn require_role(
    state: &AppState,
    auth: &AuthUser,
    allowed: &[Role],
    denied_message: &str,
) -> Result<UserProfile, ApiError> {
    let profile = state
        .users
        .find_by_uid(&auth.uid)
        .await?
        .ok_or_else(|| ApiError::authorization("No profile exists for this account"))?;

    if allowed.contains(&profile.role) {
        Ok(profile)
    } else {
        Err(ApiError::authorization(denied_message))
    }
}

/// Admin-only routes.
pub async fn require_admin(state: &AppState, auth: &AuthUser) -> Result<UserProfile, ApiError> {
    require_role(state, auth, &[Role::Admin], "Admin access required").await
}

/// IT-or-admin routes.
pub async fn require_issue_manager(
    state: &AppState,
    auth: &AuthUser,
) -> Result<UserProfile, ApiError> {
    require_role(state, auth, &[Role::It, Role::Admin], "IT or Admin access required").await
}
