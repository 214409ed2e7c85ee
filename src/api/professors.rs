use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::Professor;
use crate::{store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list))
        .route("/:id", get(get_by_id).delete(delete))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Vec<Professor>>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::list_professors(&conn)?))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Professor>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::get_professor(&conn, &id)?))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::delete_professor(&conn, &id)?;
    Ok(Json(json!({ "success": true })))
}
