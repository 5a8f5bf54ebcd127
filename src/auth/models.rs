//! Authentication Models
//! Mission: Define the identity claims carried by credentials and the roles gates check

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Roles a persisted identity may hold. An identity without a role is a
/// plain user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin, // Manages users and removes listings
    #[serde(rename = "agent")]
    Agent, // Publishes listings
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
        }
    }
}

/// Claim names the issuer owns; copies supplied by callers are dropped
pub const RESERVED_CLAIMS: [&str; 3] = ["iat", "exp", "nbf"];

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub email: String,
    /// Whatever else the caller put in the identity payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub iat: i64, // issued-at timestamp
    pub exp: i64, // expiration timestamp
}

/// Body of `POST /jwt`: the identity to sign
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /jwt`
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
