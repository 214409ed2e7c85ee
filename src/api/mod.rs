mod analytics;
mod auth;
mod classes;
mod dashboard;
mod logs;
mod professors;
mod students;

use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::routes())
        .nest("/api/dashboard", dashboard::routes())
        .nest("/api/logs", logs::routes())
        .nest("/api/students", students::routes())
        .nest("/api/classes", classes::routes())
        .nest("/api/professors", professors::routes())
        .nest("/api/analytics", analytics::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
