pub mod check_email;

pub use check_email::check_email_get;
