use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Educator account. Password material never leaves the store layer in this
/// shape; see [`ProfessorAuth`].
#[derive(Debug, Clone, Serialize)]
pub struct Professor {
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

/// Professor row including credential columns, used only by login and
/// password-change paths.
#[derive(Debug, Clone)]
pub struct ProfessorAuth {
    pub professor: Professor,
    pub password_hash: String,
    pub password_salt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub cpf: Option<String>,
    pub pc_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// Class list row with the counts the dashboard shows alongside each class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassOverview {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub student_count: i64,
    pub member_count: i64,
}

/// Single class with its co-professor member ids and enrolled student ids.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDetail {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub members: Vec<String>,
    pub students: Vec<String>,
}

/// One recorded browsing event. `student_name` is denormalized at ingestion
/// time so log listings never need a join.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub url: String,
    pub duration: i64,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

/// Trimmed log shape for the recent-activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct RecentAccess {
    pub student_name: String,
    pub url: String,
    pub category: String,
    pub duration: i64,
    pub timestamp: DateTime<Utc>,
}

/// Headline numbers for the dashboard. Keys stay camelCase because that is
/// what the dashboard client reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_alerts: i64,
    pub ai_detections: i64,
    pub total_logs: i64,
}

/// Per-student aggregate over their logs.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub student_id: String,
    pub student_name: String,
    pub cpf: Option<String>,
    pub pc_id: Option<String>,
    pub total_duration: i64,
    pub log_count: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub has_red_alert: bool,
    pub has_blue_alert: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: i64,
}

/// Optional filters on the log listing, matching the query-string names the
/// client sends (`startDate`, `endDate`, `category`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
}
