//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (`http_request` span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Security headers
//! 5. CORS (only when a frontend origin is configured)
//! 6. Rate limiting (`/api/auth` only)
//!
//! Authentication is not a layer: handlers opt in with [`RequireAuth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{BearerToken, RequireAuth, bearer_token};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
