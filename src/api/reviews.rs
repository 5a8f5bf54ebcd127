//! Review API Endpoints
//! Mission: Collect and moderate visitor reviews

use crate::{
    api::{extractors::extract_json, AppState},
    error::ApiError,
    models::{IntoDocument, NewReview},
    store::{Collection, DeleteResult, Document, Filter, FindQuery, InsertOneResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

/// GET /reviews
pub async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    let reviews = state
        .store
        .find(Collection::Reviews, &FindQuery::all())
        .await?;
    Ok(Json(reviews))
}

/// POST /reviews
pub async fn create_review(
    State(state): State<AppState>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let payload = extract_json(payload)?;
    let result = state
        .store
        .insert_one(Collection::Reviews, payload.into_document())
        .await?;
    Ok(Json(result))
}

/// DELETE /reviews/:id
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .store
        .delete_one(Collection::Reviews, &Filter::ById(id))
        .await?;
    Ok(Json(result))
}
