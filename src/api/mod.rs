//! HTTP API
//! Mission: Wire every route to its handler and the gates in front of it

pub mod agent_items;
pub mod extractors;
pub mod properties;
pub mod reviews;
pub mod users;
pub mod wishlist;

use crate::{
    auth::{api as auth_api, require_admin, require_agent, verify_token, JwtHandler},
    error::ApiError,
    middleware::request_logging,
    store::DocumentStore,
};
use axum::{
    extract::State,
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub jwt: Arc<JwtHandler>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, jwt: Arc<JwtHandler>) -> Self {
        Self { store, jwt }
    }
}

/// Requires a valid credential
fn verified(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(state.clone(), verify_token))
}

/// Requires a valid credential whose identity is an admin
fn admin_only(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    // Layers added last run first: verifier, then gate
    verified(
        route.route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        state,
    )
}

/// Requires a valid credential whose identity is an agent
fn agent_only(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    verified(
        route.route_layer(middleware::from_fn_with_state(state.clone(), require_agent)),
        state,
    )
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let s = &state;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/jwt", post(auth_api::issue_token))
        // users
        .route(
            "/users",
            admin_only(get(users::list_users), s).merge(verified(post(users::create_user), s)),
        )
        // GET takes the caller's email, PATCH the id of the user to promote
        .route(
            "/users/admin/:key",
            verified(get(users::admin_status), s).merge(admin_only(patch(users::make_admin), s)),
        )
        .route(
            "/users/agent/:key",
            verified(get(users::agent_status), s).merge(admin_only(patch(users::make_agent), s)),
        )
        .route("/users/:id", admin_only(delete(users::delete_user), s))
        // properties
        .route(
            "/properties",
            get(properties::list_properties)
                .merge(agent_only(post(properties::create_property), s)),
        )
        .route(
            "/properties/:id",
            get(properties::get_property)
                .merge(admin_only(delete(properties::delete_property), s)),
        )
        .route("/propertyCount", get(properties::property_count))
        .route("/advertise", get(properties::list_advertised))
        // wishlist
        .route(
            "/wishList",
            get(wishlist::list_wishlist).post(wishlist::add_to_wishlist),
        )
        .route("/wishList/:id", delete(wishlist::remove_from_wishlist))
        // reviews
        .route(
            "/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/reviews/:id", delete(reviews::delete_review))
        // agent-added items
        .route(
            "/myAdded",
            get(agent_items::list_my_added).post(agent_items::create_my_added),
        )
        .route(
            "/myAdded/:id",
            get(agent_items::get_my_added)
                .patch(agent_items::update_my_added)
                .delete(agent_items::delete_my_added),
        )
        .with_state(state)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Liveness banner
async fn root() -> &'static str {
    "real estate backend is running"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint; fails when the store does not answer
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.store.ping().await?;
    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
