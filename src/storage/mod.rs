pub mod document;
#[cfg(test)]
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Serialize;
use thiserror::Error;

pub use document::{document_to_json, normalize_rating, parse_object_id};
#[cfg(test)]
pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub const REVIEWS_COLLECTION: &str = "reviews";
pub const FAVORITES_COLLECTION: &str = "favorites";

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("could not create index {index}: {source}{hint}")]
    Index {
        index: &'static str,
        hint: &'static str,
        source: mongodb::error::Error,
    },

    #[error("document already exists")]
    Duplicate,

    #[error("could not encode document: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
}

/// Outcome of a single insert, returned to clients as-is
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: serde_json::Value,
}

impl InsertResult {
    pub fn acknowledged(id: ObjectId) -> Self {
        Self {
            acknowledged: true,
            inserted_id: serde_json::Value::String(id.to_hex()),
        }
    }
}

/// Filters accepted by the review listing
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub user_email: Option<String>,
    pub search: Option<String>,
}

impl ReviewFilter {
    /// Blank search terms are dropped so they never constrain the result set.
    pub fn new(user_email: Option<String>, search: Option<String>) -> Self {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self { user_email, search }
    }

    /// Search terms are matched literally, never as a pattern.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(regex::escape)
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(email) = &self.user_email {
            filter.insert("userEmail", email.as_str());
        }
        if let Some(pattern) = self.search_pattern() {
            filter.insert("foodName", doc! { "$regex": pattern, "$options": "i" });
        }
        filter
    }
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews matching `filter`, newest first.
    async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Document>, StoreError>;

    /// Up to `limit` reviews, highest rating first.
    async fn top(&self, limit: i64) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, id: ObjectId) -> Result<Option<Document>, StoreError>;

    async fn insert(&self, review: Document) -> Result<InsertResult, StoreError>;

    /// Merges `fields` into the review, returning the number of matched documents.
    async fn update(&self, id: ObjectId, fields: Document) -> Result<u64, StoreError>;

    async fn delete(&self, id: ObjectId) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the (userEmail, reviewId) pair exists.
    async fn insert(&self, favorite: Document) -> Result<InsertResult, StoreError>;

    async fn list_by_email(&self, email: &str) -> Result<Vec<Document>, StoreError>;

    async fn delete(&self, id: ObjectId) -> Result<u64, StoreError>;
}
