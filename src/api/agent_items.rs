//! Agent-Added Items API Endpoints
//! Mission: Let agents keep track of the items they submitted

use crate::{
    api::{extractors::{extract_json, extract_query}, AppState},
    error::ApiError,
    models::{AgentItemUpdate, EmailQuery, IntoDocument, NewAgentItem},
    store::{Collection, DeleteResult, Document, Filter, FindQuery, InsertOneResult, UpdateResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::debug;

/// GET /myAdded?email=
pub async fn list_my_added(
    State(state): State<AppState>,
    params: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let params = extract_query(params)?;
    let items = state
        .store
        .find(
            Collection::AgentAddedItems,
            &FindQuery::new(params.to_filter()),
        )
        .await?;
    Ok(Json(items))
}

/// GET /myAdded/:id
pub async fn get_my_added(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    let item = state
        .store
        .find_one(Collection::AgentAddedItems, &Filter::ById(id))
        .await?;
    Ok(Json(item))
}

/// POST /myAdded
pub async fn create_my_added(
    State(state): State<AppState>,
    payload: Result<Json<NewAgentItem>, JsonRejection>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let payload = extract_json(payload)?;
    let result = state
        .store
        .insert_one(Collection::AgentAddedItems, payload.into_document())
        .await?;
    Ok(Json(result))
}

/// PATCH /myAdded/:id
pub async fn update_my_added(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AgentItemUpdate>, JsonRejection>,
) -> Result<Json<UpdateResult>, ApiError> {
    let payload = extract_json(payload)?;
    let result = state
        .store
        .update_one(
            Collection::AgentAddedItems,
            &Filter::ById(id.clone()),
            payload.into_set(),
        )
        .await?;

    debug!(
        "Agent item {} updated (matched {}, modified {})",
        id, result.matched_count, result.modified_count
    );

    Ok(Json(result))
}

/// DELETE /myAdded/:id
pub async fn delete_my_added(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .store
        .delete_one(Collection::AgentAddedItems, &Filter::ById(id))
        .await?;
    Ok(Json(result))
}
