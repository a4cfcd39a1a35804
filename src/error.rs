// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every route boundary translates collaborator failures into this taxonomy;
/// the wire envelope is `{error, message, details?}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),

    // 401 Unauthorized
    Authentication(String),

    // 403 Forbidden
    Authorization(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error (record-store or identity-provider failures)
    Upstream { message: String, details: Option<String> },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category string carried in the response envelope
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Bad Request",
            ApiError::Authentication(_) => "Unauthorized",
            ApiError::Authorization(_) => "Forbidden",
            ApiError::NotFound(_) => "Not Found",
            ApiError::Upstream { .. } => "Internal Server Error",
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Authentication(msg)
            | ApiError::Authorization(msg)
            | ApiError::NotFound(msg) => msg,
            ApiError::Upstream { message, .. } => message,
        }
    }

    /// Convert to the JSON response envelope
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.category(),
            "message": self.message(),
        });
        if let ApiError::Upstream { details: Some(details), .. } = self {
            body["details"] = json!(details);
        }
        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        ApiError::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>, details: Option<String>) -> Self {
        ApiError::Upstream { message: message.into(), details }
    }
}

// Convert collaborator error types to ApiError
impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::NotFound => ApiError::not_found("Record not found"),
            other => {
                tracing::error!("record store error: {}", other);
                ApiError::upstream(
                    "Failed to reach the record store",
                    Some(other.to_string()),
                )
            }
        }
    }
}

impl From<crate::identity::IdentityError> for ApiError {
    fn from(err: crate::identity::IdentityError) -> Self {
        match err {
            crate::identity::IdentityError::InvalidToken(msg) => {
                ApiError::authentication(format!("Invalid or expired token: {}", msg))
            }
            other => {
                tracing::error!("identity provider error: {}", other);
                ApiError::upstream(
                    "Failed to reach the identity provider",
                    Some(other.to_string()),
                )
            }
        }
    }
}

impl From<crate::types::InvalidRole> for ApiError {
    fn from(err: crate::types::InvalidRole) -> Self {
        ApiError::validation(err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
