use crate::api::models::*;
use crate::api::validation::{CREATE_REVIEW, UPDATE_REVIEW, validate};
use crate::storage::{InsertResult, ReviewFilter, normalize_rating, parse_object_id};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use mongodb::bson::{DateTime, oid::ObjectId};
use serde_json::Value;
use tracing::info;

const TOP_LIMIT: i64 = 6;

fn review_id(raw: &str) -> Result<ObjectId, AppError> {
    parse_object_id(raw).ok_or(AppError::InvalidId("review"))
}

pub async fn list_reviews_handler(
    State(state): State<AppState>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let filter = ReviewFilter::new(query.user_email, query.search);
    let reviews = state.reviews.list(&filter).await?;

    info!(found = reviews.len(), search = ?filter.search, "Listed reviews");

    Ok(Json(ReviewListResponse {
        reviews: reviews.into_iter().map(review_json).collect(),
    }))
}

/// Highest rated reviews as a bare array; order among equal ratings is unspecified.
pub async fn top_reviews_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, AppError> {
    let reviews = state.reviews.top(TOP_LIMIT).await?;
    Ok(Json(reviews.into_iter().map(review_json).collect()))
}

pub async fn get_review_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = review_id(&id)?;

    match state.reviews.get(id).await? {
        Some(review) => Ok(Json(review_json(review))),
        None => Err(AppError::NotFound("Review not found".to_string())),
    }
}

pub async fn create_review_handler(
    State(state): State<AppState>,
    body: JsonObject,
) -> Result<(StatusCode, Json<InsertResult>), AppError> {
    validate(&body.0, CREATE_REVIEW).map_err(AppError::Validation)?;

    let mut review = body.into_document()?;
    normalize_rating(&mut review);
    review.insert("date", DateTime::now());

    let result = state.reviews.insert(review).await?;

    info!(id = %result.inserted_id, "Review added");

    Ok((StatusCode::CREATED, Json(result)))
}

/// Merge every provided body field into the review.
pub async fn update_review_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonObject,
) -> Result<Json<MessageResponse>, AppError> {
    validate(&body.0, UPDATE_REVIEW).map_err(AppError::Validation)?;
    let id = review_id(&id)?;

    let mut fields = body.into_document()?;
    normalize_rating(&mut fields);

    let matched = state.reviews.update(id, fields).await?;
    if matched == 0 {
        return Err(AppError::NotFound("Review not found".to_string()));
    }

    info!(%id, "Review updated");

    Ok(MessageResponse::new("Review updated successfully"))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = review_id(&id)?;

    if state.reviews.delete(id).await? == 0 {
        return Err(AppError::NotFound("Review not found".to_string()));
    }

    info!(%id, "Review deleted");

    Ok(MessageResponse::new("Review deleted successfully"))
}
