use std::sync::Arc;

use axum::{routing::get, Json, Router};
use prodrev_db::ProductRepository;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::{health, products};

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: &'static str,
}

/// Full HTTP surface: greeting, product routes and health, wrapped in request tracing.
pub fn app(repository: Arc<dyn ProductRepository>) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(products::router(repository.clone()))
        .merge(health::router(repository))
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Greeting> {
    Json(Greeting { message: "Hello World" })
}
