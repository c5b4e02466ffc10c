use crate::api::validation::FieldError;
use crate::storage::{
    FavoriteRepository, ReviewRepository, StoreError, document_to_json, normalize_rating,
};
use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mongodb::bson::{self, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub reviews: Arc<dyn ReviewRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: ReviewRepository + FavoriteRepository + 'static,
    {
        Self {
            reviews: store.clone(),
            favorites: store,
        }
    }
}

/// Query string accepted by `GET /reviews`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReviewsQuery {
    pub user_email: Option<String>,
    pub search: Option<String>,
}

/// Response from the review listing
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// A request body that parsed as a JSON object
#[derive(Debug)]
pub struct JsonObject(pub Map<String, Value>);

impl<S: Send + Sync> FromRequest<S> for JsonObject {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(AppError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }
}

impl JsonObject {
    /// Convert the body to a BSON document, dropping any client supplied `_id`.
    pub fn into_document(mut self) -> Result<Document, AppError> {
        self.0.remove("_id");
        bson::to_document(&self.0)
            .map_err(|e| AppError::BadRequest(format!("Request body cannot be stored: {e}")))
    }
}

/// Render a stored review with its rating coerced to a number.
pub fn review_json(mut review: Document) -> Value {
    normalize_rating(&mut review);
    document_to_json(review)
}

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid {0} id")]
    InvalidId(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), errors)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            e @ AppError::InvalidId(_) => (StatusCode::BAD_REQUEST, e.to_string(), Vec::new()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            AppError::Storage(e) => {
                error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Vec::new(),
                )
            }
        };

        (status, Json(ErrorResponse {
            error: status.to_string(),
            message,
            errors,
        }))
        .into_response()
    }
}
