use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{LogFilters, LogRecord, RecentAccess};
use crate::{store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(ingest))
        .route("/recent", get(recent))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(filters): Query<LogFilters>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::list_logs(&conn, &filters)?))
}

#[derive(Deserialize)]
struct RecentParams {
    limit: Option<i64>,
}

async fn recent(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<RecentAccess>>, ApiError> {
    let limit = params.limit.unwrap_or(10).max(0);
    let conn = state.conn();
    Ok(Json(store::recent_logs(&conn, limit)?))
}

#[derive(Deserialize)]
struct IngestEntry {
    student_id: String,
    url: String,
    duration: i64,
    category: String,
    timestamp: Option<DateTime<Utc>>,
}

/// Batch ingestion endpoint for the monitoring agent running on the lab
/// machines. Unauthenticated, like the rest of the agent-facing surface;
/// every entry must reference a known student.
async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<IngestEntry>>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if entries.is_empty() {
        return Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "ingested": 0 })),
        ));
    }

    let conn = state.conn();
    let count = entries.len();

    // Resolve every entry before writing anything: a rejected batch must
    // leave no partial rows behind, or the agent's retry duplicates them.
    let mut resolved = Vec::with_capacity(count);
    for entry in entries {
        let student = match store::get_student(&conn, &entry.student_id) {
            Ok(s) => s,
            Err(ApiError::NotFound(_)) => {
                return Err(ApiError::Validation(format!(
                    "student_id desconhecido: {}",
                    entry.student_id
                )))
            }
            Err(e) => return Err(e),
        };
        resolved.push((entry, student));
    }

    for (entry, student) in resolved {
        store::insert_log(
            &conn,
            &student.id,
            &student.full_name,
            &entry.url,
            entry.duration,
            &entry.category,
            entry.timestamp.unwrap_or_else(Utc::now),
        )?;
    }
    tracing::info!("ingested {count} logs");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "ingested": count })),
    ))
}
