use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{DashboardStats, LogFilters, UserSummary};
use crate::{alerts, store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(users))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let conn = state.conn();
    let total_students = store::count_students(&conn)?;
    let logs = store::list_logs(&conn, &LogFilters::default())?;
    Ok(Json(alerts::dashboard_stats(total_students, &logs, &state.rules)))
}

/// Per-student aggregate feed for the dashboard table: totals, last
/// activity, and alert flags for every student, including those with no
/// logged activity yet.
async fn users(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let conn = state.conn();
    let students = store::list_students(&conn)?;
    let logs = store::list_logs(&conn, &LogFilters::default())?;
    Ok(Json(alerts::summarize_students(&students, &logs, &state.rules)))
}
