use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{CategoryCount, HourCount, LogFilters};
use crate::{alerts, store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(categories))
        .route("/by-hour", get(by_hour))
}

async fn categories(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    let conn = state.conn();
    let logs = store::list_logs(&conn, &LogFilters::default())?;
    Ok(Json(alerts::category_breakdown(&logs)))
}

async fn by_hour(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Vec<HourCount>>, ApiError> {
    let conn = state.conn();
    let logs = store::list_logs(&conn, &LogFilters::default())?;
    Ok(Json(alerts::activity_by_hour(&logs)))
}
