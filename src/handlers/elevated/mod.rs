pub mod issues;
pub mod users;

pub use issues::{issue_resolve_put, issues_get};
pub use users::{user_put, users_search_get};
