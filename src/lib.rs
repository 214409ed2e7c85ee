//! classwatchd — backend for a student-activity monitoring dashboard.
//!
//! Ingests browsing logs for students, classifies them into alert buckets
//! (`red` for social/streaming/uncategorized activity, `blue` for AI-tool
//! usage), and serves aggregated statistics plus class and student
//! management to professors over a JSON HTTP API.
//!
//! Layering: `store` maps domain operations onto SQLite, `alerts` is pure
//! aggregation over log sets, `api` is the HTTP surface and the only place
//! errors become status codes, `auth` is the cookie-session scheme.

pub mod alerts;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use alerts::AlertRules;
use config::Config;

pub struct AppState {
    db: Mutex<Connection>,
    pub rules: AlertRules,
    pub session_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Arc<Self>> {
        let conn = db::open_db(&config.db_path)?;
        let rules = AlertRules::from_rows(store::load_alert_rules(&conn)?);
        Ok(Arc::new(Self {
            db: Mutex::new(conn),
            rules,
            session_ttl_hours: config.session_ttl_hours,
            reset_ttl_minutes: config.reset_ttl_minutes,
        }))
    }

    /// Handlers do all their store work synchronously under this lock and
    /// never hold it across an await point.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
