//! Cookie based authentication for the REST server.

pub(crate) mod cookie;
mod middleware;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
