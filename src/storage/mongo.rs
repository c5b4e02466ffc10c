use super::{
    FAVORITES_COLLECTION, FavoriteRepository, InsertResult, REVIEWS_COLLECTION, ReviewFilter,
    ReviewRepository, StoreError, document::bson_to_json,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{Document, doc, oid::ObjectId},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    results::InsertOneResult,
};
use tracing::info;

const DUPLICATE_KEY_CODE: i32 = 11000;
const UNIQUE_FAVORITE_HINT: &str =
    "; the favorites collection probably holds duplicate (userEmail, reviewId) pairs, remove them and restart";
const SORT_KEY: &str = "_numericRating";

/// MongoDB backed repositories for reviews and favorites
#[derive(Clone)]
pub struct MongoStore {
    reviews: Collection<Document>,
    favorites: Collection<Document>,
}

impl MongoStore {
    /// Connect, verify the server answers and create the indexes the handlers rely on.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);

        db.run_command(doc! { "ping": 1 }).await?;
        info!(database = db_name, "Connected to MongoDB");

        let reviews = db.collection::<Document>(REVIEWS_COLLECTION);
        let favorites = db.collection::<Document>(FAVORITES_COLLECTION);

        reviews
            .create_index(IndexModel::builder().keys(doc! { "foodName": "text" }).build())
            .await
            .map_err(|source| StoreError::Index {
                index: "reviews.foodName (text)",
                hint: "",
                source,
            })?;

        favorites
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userEmail": 1, "reviewId": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await
            .map_err(|source| StoreError::Index {
                index: "favorites.{userEmail, reviewId} (unique)",
                hint: UNIQUE_FAVORITE_HINT,
                source,
            })?;

        info!("Indexes ready");

        Ok(Self { reviews, favorites })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE
    )
}

/// Sort on the numeric value of `rating` so legacy string ratings rank with numbers.
fn top_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$addFields": { "_numericRating": {
            "$convert": { "input": "$rating", "to": "double", "onError": null, "onNull": null }
        } } },
        doc! { "$sort": { "_numericRating": -1 } },
        doc! { "$limit": limit },
        doc! { "$unset": SORT_KEY },
    ]
}

fn insert_result(result: InsertOneResult) -> InsertResult {
    match result.inserted_id.as_object_id() {
        Some(id) => InsertResult::acknowledged(id),
        None => InsertResult {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        },
    }
}

#[async_trait]
impl ReviewRepository for MongoStore {
    async fn list(&self, filter: &ReviewFilter) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .reviews
            .find(filter.to_document())
            .sort(doc! { "date": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn top(&self, limit: i64) -> Result<Vec<Document>, StoreError> {
        let cursor = self.reviews.aggregate(top_pipeline(limit)).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        Ok(self.reviews.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, review: Document) -> Result<InsertResult, StoreError> {
        let result = self.reviews.insert_one(review).await?;
        Ok(insert_result(result))
    }

    async fn update(&self, id: ObjectId, fields: Document) -> Result<u64, StoreError> {
        // An empty $set is rejected by the server
        if fields.is_empty() {
            return Ok(self.reviews.count_documents(doc! { "_id": id }).await?);
        }

        let result = self
            .reviews
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete(&self, id: ObjectId) -> Result<u64, StoreError> {
        let result = self.reviews.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl FavoriteRepository for MongoStore {
    async fn insert(&self, favorite: Document) -> Result<InsertResult, StoreError> {
        match self.favorites.insert_one(favorite).await {
            Ok(result) => Ok(insert_result(result)),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Document>, StoreError> {
        let cursor = self.favorites.find(doc! { "userEmail": email }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete(&self, id: ObjectId) -> Result<u64, StoreError> {
        let result = self.favorites.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }
}
