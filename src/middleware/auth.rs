use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::identity::IdentityClaims;
use crate::state::AppState;

/// Authenticated caller context extracted from the verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

impl From<IdentityClaims> for AuthUser {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            uid: claims.uid,
            email: claims.email,
        }
    }
}

/// Authentication middleware: validates the bearer token against the
/// identity provider and injects the caller context into the request.
pub async fn bearer_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_from_headers(&headers).map_err(ApiError::authentication)?;

    let claims = state.identity.verify_token(&token).await?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "No valid authorization token provided".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
