//! Wishlist API Endpoints

use crate::{
    api::{extractors::{extract_json, extract_query}, AppState},
    error::ApiError,
    models::{EmailQuery, IntoDocument, NewWishListItem},
    store::{Collection, DeleteResult, Document, Filter, FindQuery, InsertOneResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

/// GET /wishList?email=
pub async fn list_wishlist(
    State(state): State<AppState>,
    params: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let params = extract_query(params)?;
    let items = state
        .store
        .find(Collection::WishList, &FindQuery::new(params.to_filter()))
        .await?;
    Ok(Json(items))
}

/// POST /wishList
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    payload: Result<Json<NewWishListItem>, JsonRejection>,
) -> Result<Json<InsertOneResult>, ApiError> {
    let payload = extract_json(payload)?;
    let result = state
        .store
        .insert_one(Collection::WishList, payload.into_document())
        .await?;
    Ok(Json(result))
}

/// DELETE /wishList/:id
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>, ApiError> {
    let result = state
        .store
        .delete_one(Collection::WishList, &Filter::ById(id))
        .await?;
    Ok(Json(result))
}
