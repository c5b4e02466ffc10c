use crate::api::models::AppState;
use crate::api::review::handlers::*;
use axum::{Router, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews_handler).post(create_review_handler))
        .route("/reviews/top", get(top_reviews_handler))
        .route(
            "/reviews/{id}",
            get(get_review_handler)
                .put(update_review_handler)
                .delete(delete_review_handler),
        )
}
