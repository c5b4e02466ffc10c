use crate::api::favorite::handlers::*;
use crate::api::models::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", post(create_favorite_handler))
        // GET takes a user email, DELETE a favorite id
        .route(
            "/favorites/{key}",
            get(list_favorites_handler).delete(delete_favorite_handler),
        )
}
