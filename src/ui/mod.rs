//! Web UI

pub mod handlers;

pub use handlers::{login_form, login_submit};
