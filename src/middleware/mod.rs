//! Middleware for observability.
//!
//! Authentication and role gates live in `auth::middleware`; this module
//! only carries request logging.

pub mod logging;

pub use logging::request_logging;
