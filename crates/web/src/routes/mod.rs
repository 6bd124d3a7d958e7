use std::time::Duration;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use storage::Database;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::WebError;
use crate::features::{athletes, categories, training_centers};
use crate::openapi::ApiDoc;

pub fn router(db: Database, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let api = Router::new()
        .nest("/athletes", athletes::routes::routes())
        .nest("/categories", categories::routes::routes())
        .nest("/training_centers", training_centers::routes::routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(db)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> WebError {
    WebError::NotFound
}
