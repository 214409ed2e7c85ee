use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::{ClassDetail, ClassOverview};
use crate::{store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_by_id).delete(delete))
        .route("/:id/members/:professor_id", post(add_member).delete(remove_member))
        .route("/:id/students/:student_id", post(add_student).delete(remove_student))
}

async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Result<Json<Vec<ClassOverview>>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::list_classes(&conn)?))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ClassDetail>, ApiError> {
    let conn = state.conn();
    Ok(Json(store::get_class(&conn, &id)?))
}

#[derive(Deserialize)]
struct CreateClassBody {
    name: String,
    owner_id: Option<String>,
}

/// Creates a class. The owner defaults to the authenticated professor; an
/// explicit owner_id must reference an existing professor.
async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(body): Json<CreateClassBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::missing_field("name"));
    }

    let conn = state.conn();
    let owner_id = match body.owner_id {
        Some(id) => match store::get_professor(&conn, &id) {
            Ok(p) => p.id,
            Err(ApiError::NotFound(_)) => {
                return Err(ApiError::Validation("owner_id inválido".into()))
            }
            Err(e) => return Err(e),
        },
        None => user.professor.id,
    };

    let class = store::create_class(&conn, name, &owner_id)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": class })),
    ))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::delete_class(&conn, &id)?;
    Ok(Json(json!({ "success": true })))
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path((id, professor_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::add_class_member(&conn, &id, &professor_id)?;
    Ok(Json(json!({ "success": true })))
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path((id, professor_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::remove_class_member(&conn, &id, &professor_id)?;
    Ok(Json(json!({ "success": true })))
}

async fn add_student(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path((id, student_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::add_class_student(&conn, &id, &student_id)?;
    Ok(Json(json!({ "success": true })))
}

async fn remove_student(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path((id, student_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = state.conn();
    store::remove_class_student(&conn, &id, &student_id)?;
    Ok(Json(json!({ "success": true })))
}
