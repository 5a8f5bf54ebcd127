//! Property API Endpoints
//! Mission: Browse, search, publish and remove listings

use crate::{
    api::{extractors::{extract_json, extract_query}, AppState},
    error::ApiError,
    models::{CountResponse, IntoDocument, NewProperty, PropertyQuery},
    store::{Collection, DeleteResult, Document, Filter, FindQuery, InsertOneResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tracing::info;

/// GET /properties?search=&page=&size=&sort=
pub async fn list_properties(
    State(state): State<AppState>,
    params: Result<Query<PropertyQuery>, QueryRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let params = extract_query(params)?;
    let properties = state
        .store
        .find(Collection::Properties, &params.to_find_query())
        .await?;
    Ok(Json(properties))
}

/// GET /properties/:id; `null` when there is no such listing
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    let property = state
        .store
        .find_one(Collection::Properties, &Filter::ById(id))
        .await?;
    Ok(Json(property))
}

/// POST /properties (Agent only)
pub async fn create_property(
    State(state): State<AppState>,
    payload: Result<Json<NewProperty>, JsonRejection>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let payload = extract_json(payload)?;
    let result = state
        .store
        .insert_one(Collection::Properties, payload.into_document())
        .await?;

    info!("🏠 Listing published: {}", result.inserted_id);

    Ok(Json(result))
}

/// DELETE /properties/:id (Admin only)
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .store
        .delete_one(Collection::Properties, &Filter::ById(id))
        .await?;
    Ok(Json(result))
}

/// GET /propertyCount - estimated, for client-side pagination
pub async fn property_count(
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.store.estimated_count(Collection::Properties).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /advertise
pub async fn list_advertised(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let advertised = state
        .store
        .find(Collection::Advertise, &FindQuery::all())
        .await?;
    Ok(Json(advertised))
}
