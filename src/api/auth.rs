use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, CurrentUser, SESSION_COOKIE};
use crate::error::ApiError;
use crate::{store, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(trimmed)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::Validation(
            "A senha deve ter pelo menos 6 caracteres".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RegisterBody {
    full_name: String,
    username: String,
    email: String,
    password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let full_name = require(&body.full_name, "full_name")?;
    let username = require(&body.username, "username")?;
    let email = require(&body.email, "email")?;
    if !email.contains('@') {
        return Err(ApiError::Validation("E-mail inválido".into()));
    }
    validate_password(&body.password)?;

    let conn = state.conn();
    if store::username_exists(&conn, username)? {
        return Err(ApiError::Validation("Nome de usuário já cadastrado".into()));
    }
    if store::email_exists(&conn, email)? {
        return Err(ApiError::Validation("E-mail já cadastrado".into()));
    }

    let salt = auth::new_salt();
    let hash = auth::hash_password(&body.password, &salt);
    let professor = store::create_professor(&conn, full_name, username, email, &hash, &salt)?;

    // Registering also signs the new professor in, as the dashboard expects.
    let token = auth::issue_session(&conn, &professor.id, state.session_ttl_hours)?;
    tracing::info!("professor registered: {username}");

    Ok((
        jar.add(auth::session_cookie(token)),
        Json(json!({ "success": true, "user": professor })),
    ))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let email = require(&body.email, "email")?;
    require(&body.password, "password")?;

    let conn = state.conn();
    let account = store::get_professor_auth_by_email(&conn, email)?
        .ok_or_else(|| ApiError::Auth("Credenciais inválidas".into()))?;
    if !auth::verify_password(&body.password, &account.password_salt, &account.password_hash) {
        return Err(ApiError::Auth("Credenciais inválidas".into()));
    }

    let token = auth::issue_session(&conn, &account.professor.id, state.session_ttl_hours)?;
    Ok((
        jar.add(auth::session_cookie(token)),
        Json(json!({ "success": true, "user": account.professor })),
    ))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let conn = state.conn();
    store::delete_session(&conn, &user.token)?;
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    Ok((jar, Json(json!({ "success": true }))))
}

async fn profile(user: CurrentUser) -> Json<serde_json::Value> {
    Json(json!(user.professor))
}

#[derive(Deserialize)]
struct ForgotPasswordBody {
    email: String,
}

/// Always answers success so the endpoint cannot be used to probe which
/// e-mails have accounts. Mail delivery is out of scope; the token is only
/// recorded server-side.
async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = require(&body.email, "email")?;

    let conn = state.conn();
    if let Some(account) = store::get_professor_auth_by_email(&conn, email)? {
        auth::issue_reset_token(&conn, &account.professor.id, state.reset_ttl_minutes)?;
        tracing::info!("password reset token issued for {email}");
    }

    Ok(Json(json!({
        "success": true,
        "message": "Se o e-mail estiver cadastrado, um link de redefinição será enviado",
    })))
}

#[derive(Deserialize)]
struct ResetPasswordBody {
    token: String,
    new_password: String,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require(&body.token, "token")?;
    validate_password(&body.new_password)?;

    let conn = state.conn();
    let professor_id = store::consume_reset_token(&conn, &body.token, Utc::now())?
        .ok_or_else(|| ApiError::Validation("Token inválido ou expirado".into()))?;

    let salt = auth::new_salt();
    let hash = auth::hash_password(&body.new_password, &salt);
    store::update_professor_password(&conn, &professor_id, &hash, &salt)?;
    // Existing sessions were opened with the old password; drop them.
    store::delete_sessions_for(&conn, &professor_id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Senha redefinida com sucesso",
    })))
}

#[derive(Deserialize)]
struct ChangePasswordBody {
    current_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(body): Json<ChangePasswordBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require(&body.current_password, "current_password")?;
    validate_password(&body.new_password)?;

    let conn = state.conn();
    let account = store::get_professor_auth(&conn, &user.professor.id)?;
    if !auth::verify_password(
        &body.current_password,
        &account.password_salt,
        &account.password_hash,
    ) {
        return Err(ApiError::Validation("Senha atual incorreta".into()));
    }

    let salt = auth::new_salt();
    let hash = auth::hash_password(&body.new_password, &salt);
    store::update_professor_password(&conn, &user.professor.id, &hash, &salt)?;

    Ok(Json(json!({
        "success": true,
        "message": "Senha alterada com sucesso",
    })))
}
