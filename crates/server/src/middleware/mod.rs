//! HTTP middleware stack for the scan server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Actor extractor (per-route, identifies the scanning operator)

pub mod actor;

pub use actor::RequireActor;
