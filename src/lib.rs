//! Real-estate listing backend library
//!
//! Exposes the router, auth chain and document store for the server binary
//! and the integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod store;
