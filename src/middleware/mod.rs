pub mod auth;
pub mod guards;

pub use auth::{bearer_auth_middleware, AuthUser};
pub use guards::{require_admin, require_issue_manager};
