//! User API Endpoints
//! Mission: Registration, role lookups and role promotion

use crate::{
    api::{extractors::extract_json, AppState},
    auth::models::{Claims, Role},
    error::ApiError,
    models::{AdminStatus, AgentStatus, AlreadyExists, IntoDocument, NewUser},
    store::{Collection, DeleteResult, Document, Filter, FindQuery, InsertOneResult, UpdateResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;

/// List all users - GET /users (Admin only)
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    let users = state
        .store
        .find(Collection::Users, &FindQuery::all())
        .await?;
    Ok(Json(users))
}

/// Does the caller's identity hold `role`? Only answers about oneself.
async fn holds_role(
    state: &AppState,
    claims: &Claims,
    email: &str,
    role: Role,
) -> Result<bool, ApiError> {
    if email != claims.email {
        return Err(ApiError::Forbidden);
    }

    let user = state
        .store
        .find_one(Collection::Users, &Filter::eq("email", email))
        .await?;

    Ok(user
        .as_ref()
        .and_then(|doc| doc.get("role"))
        .and_then(Value::as_str)
        == Some(role.as_str()))
}

/// GET /users/admin/:email
pub async fn admin_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, ApiError> {
    let admin = holds_role(&state, &claims, &email, Role::Admin).await?;
    Ok(Json(AdminStatus { admin }))
}

/// GET /users/agent/:email
pub async fn agent_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> Result<Json<AgentStatus>, ApiError> {
    let agent = holds_role(&state, &claims, &email, Role::Agent).await?;
    Ok(Json(AgentStatus { agent }))
}

/// Register - POST /users
///
/// Callers may only register the identity their credential names. An email
/// that is already registered is answered with a null id and no write.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = extract_json(payload)?;
    if payload.email != claims.email {
        return Err(ApiError::Forbidden);
    }

    let existing = state
        .store
        .find_one(Collection::Users, &Filter::eq("email", payload.email.as_str()))
        .await?;
    if existing.is_some() {
        return Ok(Json(AlreadyExists::user()).into_response());
    }

    let result: InsertOneResult = state
        .store
        .insert_one(Collection::Users, payload.into_document())
        .await?;

    info!("✅ Registered user {} ({})", claims.email, result.inserted_id);

    Ok(Json(result).into_response())
}

async fn promote(state: &AppState, id: String, role: Role) -> Result<Json<UpdateResult>, ApiError> {
    let mut set = Document::new();
    set.insert("role".to_string(), json!(role.as_str()));

    let result = state
        .store
        .update_one(Collection::Users, &Filter::ById(id.clone()), set)
        .await?;

    info!(
        "👑 User {} promoted to {} (matched {})",
        id,
        role.as_str(),
        result.matched_count
    );

    Ok(Json(result))
}

/// PATCH /users/admin/:id (Admin only)
pub async fn make_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    promote(&state, id, Role::Admin).await
}

/// PATCH /users/agent/:id (Admin only)
pub async fn make_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResult>, ApiError> {
    promote(&state, id, Role::Agent).await
}

/// DELETE /users/:id (Admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .store
        .delete_one(Collection::Users, &Filter::ById(id.clone()))
        .await?;

    info!("🗑️  Deleted user {} (deleted {})", id, result.deleted_count);

    Ok(Json(result))
}
