mod auth;
pub use auth::{AUTH_TOKEN, drop_session_cookie, extract_context_fn};

mod policy;
pub use policy::require_admin_fn;
