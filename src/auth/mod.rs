//! Authentication Module
//! Mission: Secure API access with JWT credentials and role gates

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtHandler, TokenError};
pub use middleware::{require_admin, require_agent, verify_token};
pub use models::{Claims, Role};
