use crate::api::models::*;
use crate::api::validation::{CREATE_FAVORITE, validate};
use crate::storage::{
    InsertResult, ReviewRepository, StoreError, document_to_json, parse_object_id,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use futures::future::try_join_all;
use mongodb::bson::{DateTime, Document};
use serde_json::Value;
use tracing::{info, warn};

pub async fn create_favorite_handler(
    State(state): State<AppState>,
    body: JsonObject,
) -> Result<(StatusCode, Json<InsertResult>), AppError> {
    validate(&body.0, CREATE_FAVORITE).map_err(AppError::Validation)?;

    let mut favorite = body.into_document()?;
    favorite.insert("date", DateTime::now());

    let result = match state.favorites.insert(favorite).await {
        Ok(result) => result,
        Err(StoreError::Duplicate) => {
            return Err(AppError::BadRequest("Review already favorited".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(id = %result.inserted_id, "Favorite added");

    Ok((StatusCode::CREATED, Json(result)))
}

/// Favorites for `email`, each joined with the review it points at.
pub async fn list_favorites_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let favorites = state.favorites.list_by_email(&email).await?;

    let reviews = state.reviews.as_ref();
    let merged = try_join_all(
        favorites
            .into_iter()
            .map(|favorite| with_review(reviews, favorite)),
    )
    .await?;

    info!(%email, found = merged.len(), "Listed favorites");

    Ok(Json(merged))
}

/// A malformed or dangling `reviewId` yields `review: null` for that favorite only.
async fn with_review(
    reviews: &dyn ReviewRepository,
    favorite: Document,
) -> Result<Value, AppError> {
    let review_id = favorite.get_str("reviewId").ok().and_then(parse_object_id);

    let review = match review_id {
        Some(id) => reviews.get(id).await?.map(review_json),
        None => {
            warn!(favorite = ?favorite.get("_id"), "Favorite references a malformed review id");
            None
        }
    };

    let mut record = document_to_json(favorite);
    record["review"] = review.unwrap_or(Value::Null);
    Ok(record)
}

pub async fn delete_favorite_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_object_id(&id).ok_or(AppError::InvalidId("favorite"))?;

    if state.favorites.delete(id).await? == 0 {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }

    info!(%id, "Favorite removed");

    Ok(MessageResponse::new("Favorite removed successfully"))
}
