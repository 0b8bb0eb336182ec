//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. Session layer (Postgres or memory store, added by the caller of `app`)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID
//! 5. Rate limiting (governor), per route group

pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use rate_limit::{api_rate_limiter, submit_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
