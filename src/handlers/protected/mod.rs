pub mod bootstrap;
pub mod issues;
pub mod profile;

pub use bootstrap::bootstrap_post;
pub use issues::issue_post;
pub use profile::{profile_get, profile_put};
