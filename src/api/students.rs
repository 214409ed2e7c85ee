use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::Student;
use crate::{store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_by_id).delete(delete))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Vec<Student>>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::list_students(&conn)?))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::get_student(&conn, &id)?))
}

#[derive(Deserialize)]
struct CreateStudentBody {
    full_name: String,
    cpf: Option<String>,
    pc_id: Option<String>,
}

async fn create(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(body): Json<CreateStudentBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let full_name = body.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::missing_field("full_name"));
    }

    let conn = state.conn();
    let student = store::create_student(&conn, full_name, body.cpf.as_deref(), body.pc_id.as_deref())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": student })),
    ))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::delete_student(&conn, &id)?;
    Ok(Json(json!({ "success": true })))
}
