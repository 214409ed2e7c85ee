//! Cookie-session authentication. One opaque token per login, stored in the
//! `sessions` table and carried by an HttpOnly cookie; passwords are salted
//! SHA-256 digests. The [`CurrentUser`] extractor gates every protected
//! route.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::Professor;
use crate::{store, AppState};

pub const SESSION_COOKIE: &str = "classwatch_session";

pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt) == expected_hash
}

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Creates a session row for the professor and returns its token. Expired
/// sessions are swept opportunistically here rather than by a background
/// task.
pub fn issue_session(
    conn: &Connection,
    professor_id: &str,
    ttl_hours: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    store::purge_expired_sessions(conn, now)?;

    let token = new_token();
    store::create_session(conn, &token, professor_id, now, now + Duration::hours(ttl_hours))?;
    Ok(token)
}

pub fn issue_reset_token(
    conn: &Connection,
    professor_id: &str,
    ttl_minutes: i64,
) -> Result<String, ApiError> {
    let token = new_token();
    let expires_at: DateTime<Utc> = Utc::now() + Duration::minutes(ttl_minutes);
    store::create_reset_token(conn, &token, professor_id, expires_at)?;
    Ok(token)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn unauthorized() -> ApiError {
    ApiError::Auth(
        "Sessão inválida ou expirada. Limpe as credenciais salvas e faça login novamente.".into(),
    )
}

/// Authenticated professor, resolved from the session cookie. Missing,
/// unknown, or expired sessions reject with 401.
pub struct CurrentUser {
    pub professor: Professor,
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(unauthorized)?;

        let conn = state.conn();
        let professor =
            store::session_professor(&conn, &token, Utc::now())?.ok_or_else(unauthorized)?;
        Ok(CurrentUser { professor, token })
    }
}
