//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. Session layer (SameSite=Strict, 24h)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID
//! 5. Auth guard on `/api` (`RequireAdminAuth` as a route layer)
//! 6. Login throttling on `/auth/login`

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAdminAuth, clear_current_admin, set_current_admin};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
