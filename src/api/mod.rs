pub mod favorite;
pub mod models;
pub mod review;
pub mod validation;


// Re-exports
pub use models::*;

use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    routing::get,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'self'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

pub async fn health_handler() -> &'static str {
    "Food review server is running"
}

/// Build the full application: routes, CORS, security headers and request tracing.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(health_handler))
        .merge(review::routes())
        .merge(favorite::routes())
        .with_state(state);

    for &(name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
