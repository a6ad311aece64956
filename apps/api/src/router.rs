use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;

async fn health() -> Json<Value> {
    Json(json!({ "service": "appointments", "status": "ok" }))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental Clinic API is running!" }))
        .route("/health", get(health))
        .nest("/api/v1", appointment_routes(state.clone()))
}
