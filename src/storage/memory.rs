//! In-process repositories with the same observable behavior as [`super::MongoStore`].

use super::{
    FavoriteRepository, InsertResult, ReviewFilter, ReviewRepository, StoreError,
    document::{RATING_FIELD, numeric_rating},
};
use async_trait::async_trait;
use mongodb::bson::{Bson, Document, oid::ObjectId};
use regex::RegexBuilder;
use std::cmp::Ordering;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    reviews: RwLock<Vec<Document>>,
    favorites: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn favorite_count(&self) -> usize {
        self.favorites.read().await.len()
    }
}

impl ReviewFilter {
    fn matches(&self, review: &Document) -> bool {
        if let Some(email) = &self.user_email {
            if review.get_str("userEmail").ok() != Some(email.as_str()) {
                return false;
            }
        }
        if let Some(pattern) = self.search_pattern() {
            let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
                return false;
            };
            return review.get_str("foodName").is_ok_and(|name| re.is_match(name));
        }
        true
    }
}

fn has_id(document: &Document, id: ObjectId) -> bool {
    document.get_object_id("_id").ok() == Some(id)
}

fn with_new_id(mut document: Document) -> (ObjectId, Document) {
    let id = ObjectId::new();
    document.insert("_id", id);
    (id, document)
}

fn date_millis(document: &Document) -> i64 {
    document
        .get_datetime("date")
        .map(|d| d.timestamp_millis())
        .unwrap_or(i64::MIN)
}

fn rating_value(document: &Document) -> f64 {
    match document.get(RATING_FIELD).map(numeric_rating) {
        Some(Bson::Int32(n)) => n as f64,
        Some(Bson::Int64(n)) => n as f64,
        Some(Bson::Double(f)) => f,
        _ => f64::MIN,
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Document>, StoreError> {
        let mut found: Vec<Document> = self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| std::cmp::Reverse(date_millis(r)));
        Ok(found)
    }

    async fn top(&self, limit: i64) -> Result<Vec<Document>, StoreError> {
        let mut all = self.reviews.read().await.clone();
        all.sort_by(|a, b| {
            rating_value(b)
                .partial_cmp(&rating_value(a))
                .unwrap_or(Ordering::Equal)
        });
        all.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(all)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .find(|r| has_id(r, id))
            .cloned())
    }

    async fn insert(&self, review: Document) -> Result<InsertResult, StoreError> {
        let (id, review) = with_new_id(review);
        self.reviews.write().await.push(review);
        Ok(InsertResult::acknowledged(id))
    }

    async fn update(&self, id: ObjectId, fields: Document) -> Result<u64, StoreError> {
        let mut reviews = self.reviews.write().await;
        match reviews.iter_mut().find(|r| has_id(r, id)) {
            Some(review) => {
                for (key, value) in fields {
                    review.insert(key, value);
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<u64, StoreError> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|r| !has_id(r, id));
        Ok((before - reviews.len()) as u64)
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn insert(&self, favorite: Document) -> Result<InsertResult, StoreError> {
        let mut favorites = self.favorites.write().await;
        let same_pair = |existing: &Document| {
            existing.get("userEmail") == favorite.get("userEmail")
                && existing.get("reviewId") == favorite.get("reviewId")
        };
        if favorites.iter().any(same_pair) {
            return Err(StoreError::Duplicate);
        }

        let (id, favorite) = with_new_id(favorite);
        favorites.push(favorite);
        Ok(InsertResult::acknowledged(id))
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .favorites
            .read()
            .await
            .iter()
            .filter(|f| f.get_str("userEmail").ok() == Some(email))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: ObjectId) -> Result<u64, StoreError> {
        let mut favorites = self.favorites.write().await;
        let before = favorites.len();
        favorites.retain(|f| !has_id(f, id));
        Ok((before - favorites.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{DateTime, doc};

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        ReviewRepository::insert(&store, doc! { "foodName": "old", "date": DateTime::from_millis(1) })
            .await
            .unwrap();
        ReviewRepository::insert(&store, doc! { "foodName": "new", "date": DateTime::from_millis(2) })
            .await
            .unwrap();

        let listed = ReviewRepository::list(&store, &ReviewFilter::default()).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.get_str("foodName").unwrap()).collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn top_ranks_legacy_string_ratings_numerically() {
        let store = MemoryStore::new();
        for rating in [Bson::String("1".into()), Bson::Int32(5), Bson::String("3".into())] {
            ReviewRepository::insert(&store, doc! { "rating": rating }).await.unwrap();
        }

        let top = ReviewRepository::top(&store, 6).await.unwrap();
        let ratings: Vec<Bson> = top.iter().map(|r| numeric_rating(r.get("rating").unwrap())).collect();
        assert_eq!(ratings, vec![Bson::Int32(5), Bson::Int32(3), Bson::Int32(1)]);
    }

    #[tokio::test]
    async fn duplicate_favorite_pair_is_rejected() {
        let store = MemoryStore::new();
        let favorite = doc! { "userEmail": "a@b.com", "reviewId": "r1" };

        FavoriteRepository::insert(&store, favorite.clone()).await.unwrap();
        let second = FavoriteRepository::insert(&store, favorite).await;

        assert!(matches!(second, Err(StoreError::Duplicate)));
        assert_eq!(store.favorite_count().await, 1);
    }
}
