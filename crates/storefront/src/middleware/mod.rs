//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, error capture)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Security headers
//! 5. JSON error bodies for responses axum and governor build themselves
//! 6. CORS (only when an allowed origin is configured)
//! 7. Rate limiting on `/api` (governor)

pub mod json_errors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use json_errors::json_error_bodies;
pub use rate_limit::api_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
