//! Data-access layer: every function takes a borrowed connection, maps one
//! domain operation onto store queries, and fails fast. Store errors convert
//! into `ApiError::Store` via `?`; the API layer is the only place they are
//! turned into HTTP responses.

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Class, ClassDetail, ClassOverview, LogFilters, LogRecord, Professor, ProfessorAuth,
    RecentAccess, Student,
};

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ---------------------------------------------------------------------------
// Professors

fn map_professor_row(row: &Row) -> rusqlite::Result<Professor> {
    Ok(Professor {
        id: row.get(0)?,
        full_name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        is_owner: row.get::<_, i64>(4)? != 0,
        created_at: parse_ts(5, row.get(5)?)?,
    })
}

const PROFESSOR_COLS: &str = "id, full_name, username, email, is_owner, created_at";

pub fn list_professors(conn: &Connection) -> Result<Vec<Professor>, ApiError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFESSOR_COLS} FROM professors ORDER BY full_name"
    ))?;
    let rows = stmt
        .query_map([], map_professor_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_professor(conn: &Connection, id: &str) -> Result<Professor, ApiError> {
    conn.query_row(
        &format!("SELECT {PROFESSOR_COLS} FROM professors WHERE id = ?"),
        [id],
        map_professor_row,
    )
    .optional()?
    .ok_or_else(|| ApiError::NotFound("Professor não encontrado".into()))
}

pub fn get_professor_auth_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<ProfessorAuth>, ApiError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {PROFESSOR_COLS}, password_hash, password_salt
                 FROM professors WHERE email = ?"
            ),
            [email],
            |row| {
                Ok(ProfessorAuth {
                    professor: map_professor_row(row)?,
                    password_hash: row.get(6)?,
                    password_salt: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn get_professor_auth(conn: &Connection, id: &str) -> Result<ProfessorAuth, ApiError> {
    conn.query_row(
        &format!(
            "SELECT {PROFESSOR_COLS}, password_hash, password_salt
             FROM professors WHERE id = ?"
        ),
        [id],
        |row| {
            Ok(ProfessorAuth {
                professor: map_professor_row(row)?,
                password_hash: row.get(6)?,
                password_salt: row.get(7)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| ApiError::NotFound("Professor não encontrado".into()))
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool, ApiError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM professors WHERE username = ?", [username], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, ApiError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM professors WHERE email = ?", [email], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

pub fn create_professor(
    conn: &Connection,
    full_name: &str,
    username: &str,
    email: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<Professor, ApiError> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO professors(id, full_name, username, email, password_hash, password_salt, is_owner, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
        (
            &id,
            full_name,
            username,
            email,
            password_hash,
            password_salt,
            created_at.to_rfc3339(),
        ),
    )?;
    Ok(Professor {
        id,
        full_name: full_name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        is_owner: false,
        created_at,
    })
}

pub fn update_professor_password(
    conn: &Connection,
    id: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<(), ApiError> {
    let changed = conn.execute(
        "UPDATE professors SET password_hash = ?, password_salt = ? WHERE id = ?",
        (password_hash, password_salt, id),
    )?;
    if changed == 0 {
        return Err(ApiError::NotFound("Professor não encontrado".into()));
    }
    Ok(())
}

/// Deletes a professor and everything hanging off the account: sessions,
/// reset tokens, co-professor memberships, and the classes they own
/// (including those classes' member and roster rows, so no class is left
/// with a dangling owner).
pub fn delete_professor(conn: &Connection, id: &str) -> Result<(), ApiError> {
    get_professor(conn, id)?;

    let mut stmt = conn.prepare("SELECT id FROM classes WHERE owner_id = ?")?;
    let owned = stmt
        .query_map([id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for class_id in owned {
        conn.execute("DELETE FROM class_members WHERE class_id = ?", [&class_id])?;
        conn.execute("DELETE FROM class_students WHERE class_id = ?", [&class_id])?;
        conn.execute("DELETE FROM classes WHERE id = ?", [&class_id])?;
    }

    conn.execute("DELETE FROM class_members WHERE professor_id = ?", [id])?;
    conn.execute("DELETE FROM sessions WHERE professor_id = ?", [id])?;
    conn.execute("DELETE FROM reset_tokens WHERE professor_id = ?", [id])?;
    conn.execute("DELETE FROM professors WHERE id = ?", [id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Students

fn map_student_row(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        full_name: row.get(1)?,
        cpf: row.get(2)?,
        pc_id: row.get(3)?,
    })
}

pub fn list_students(conn: &Connection) -> Result<Vec<Student>, ApiError> {
    let mut stmt =
        conn.prepare("SELECT id, full_name, cpf, pc_id FROM students ORDER BY full_name")?;
    let rows = stmt
        .query_map([], map_student_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_student(conn: &Connection, id: &str) -> Result<Student, ApiError> {
    conn.query_row(
        "SELECT id, full_name, cpf, pc_id FROM students WHERE id = ?",
        [id],
        map_student_row,
    )
    .optional()?
    .ok_or_else(|| ApiError::NotFound("Aluno não encontrado".into()))
}

pub fn count_students(conn: &Connection) -> Result<i64, ApiError> {
    let count = conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
    Ok(count)
}

pub fn create_student(
    conn: &Connection,
    full_name: &str,
    cpf: Option<&str>,
    pc_id: Option<&str>,
) -> Result<Student, ApiError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, full_name, cpf, pc_id) VALUES (?, ?, ?, ?)",
        (&id, full_name, cpf, pc_id),
    )?;
    Ok(Student {
        id,
        full_name: full_name.to_string(),
        cpf: cpf.map(str::to_string),
        pc_id: pc_id.map(str::to_string),
    })
}

/// Deletes a student along with their enrollment rows and logs. Logs must go
/// first or the foreign keys reject the delete.
pub fn delete_student(conn: &Connection, id: &str) -> Result<(), ApiError> {
    get_student(conn, id)?;
    conn.execute("DELETE FROM logs WHERE student_id = ?", [id])?;
    conn.execute("DELETE FROM class_students WHERE student_id = ?", [id])?;
    conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Classes

pub fn list_classes(conn: &Connection) -> Result<Vec<ClassOverview>, ApiError> {
    // Correlated subqueries so joins cannot double-count.
    let mut stmt = conn.prepare(
        "SELECT
           c.id,
           c.name,
           c.owner_id,
           (SELECT COUNT(*) FROM class_students cs WHERE cs.class_id = c.id) AS student_count,
           (SELECT COUNT(*) FROM class_members cm WHERE cm.class_id = c.id) AS member_count
         FROM classes c
         ORDER BY c.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClassOverview {
                id: row.get(0)?,
                name: row.get(1)?,
                owner_id: row.get(2)?,
                student_count: row.get(3)?,
                member_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_class(conn: &Connection, id: &str) -> Result<ClassDetail, ApiError> {
    let class = conn
        .query_row(
            "SELECT id, name, owner_id FROM classes WHERE id = ?",
            [id],
            |row| {
                Ok(Class {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    owner_id: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Turma não encontrada".into()))?;

    let mut member_stmt = conn.prepare(
        "SELECT professor_id FROM class_members WHERE class_id = ? ORDER BY professor_id",
    )?;
    let members = member_stmt
        .query_map([id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut student_stmt = conn.prepare(
        "SELECT student_id FROM class_students WHERE class_id = ? ORDER BY student_id",
    )?;
    let students = student_stmt
        .query_map([id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassDetail {
        id: class.id,
        name: class.name,
        owner_id: class.owner_id,
        members,
        students,
    })
}

pub fn create_class(conn: &Connection, name: &str, owner_id: &str) -> Result<Class, ApiError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO classes(id, name, owner_id) VALUES (?, ?, ?)",
        (&id, name, owner_id),
    )?;
    Ok(Class {
        id,
        name: name.to_string(),
        owner_id: owner_id.to_string(),
    })
}

pub fn delete_class(conn: &Connection, id: &str) -> Result<(), ApiError> {
    ensure_class(conn, id)?;
    conn.execute("DELETE FROM class_members WHERE class_id = ?", [id])?;
    conn.execute("DELETE FROM class_students WHERE class_id = ?", [id])?;
    conn.execute("DELETE FROM classes WHERE id = ?", [id])?;
    Ok(())
}

fn ensure_class(conn: &Connection, id: &str) -> Result<(), ApiError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM classes WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    if found.is_none() {
        return Err(ApiError::NotFound("Turma não encontrada".into()));
    }
    Ok(())
}

/// Adding twice is a no-op; callers expect add/remove to be idempotent.
pub fn add_class_member(
    conn: &Connection,
    class_id: &str,
    professor_id: &str,
) -> Result<(), ApiError> {
    ensure_class(conn, class_id)?;
    get_professor(conn, professor_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO class_members(class_id, professor_id) VALUES (?, ?)",
        (class_id, professor_id),
    )?;
    Ok(())
}

pub fn remove_class_member(
    conn: &Connection,
    class_id: &str,
    professor_id: &str,
) -> Result<(), ApiError> {
    ensure_class(conn, class_id)?;
    conn.execute(
        "DELETE FROM class_members WHERE class_id = ? AND professor_id = ?",
        (class_id, professor_id),
    )?;
    Ok(())
}

pub fn add_class_student(
    conn: &Connection,
    class_id: &str,
    student_id: &str,
) -> Result<(), ApiError> {
    ensure_class(conn, class_id)?;
    get_student(conn, student_id)?;
    conn.execute(
        "INSERT OR IGNORE INTO class_students(class_id, student_id) VALUES (?, ?)",
        (class_id, student_id),
    )?;
    Ok(())
}

pub fn remove_class_student(
    conn: &Connection,
    class_id: &str,
    student_id: &str,
) -> Result<(), ApiError> {
    ensure_class(conn, class_id)?;
    conn.execute(
        "DELETE FROM class_students WHERE class_id = ? AND student_id = ?",
        (class_id, student_id),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Logs

fn map_log_row(row: &Row) -> rusqlite::Result<LogRecord> {
    Ok(LogRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        student_name: row.get(2)?,
        url: row.get(3)?,
        duration: row.get(4)?,
        category: row.get(5)?,
        timestamp: parse_ts(6, row.get(6)?)?,
    })
}

/// Widens a date-only bound (`2026-03-10`) to cover the whole day. Full
/// RFC 3339 bounds are reparsed and reserialized so `Z`-suffixed or
/// non-UTC-offset input lines up with the stored `+00:00` form; stored
/// timestamps are normalized RFC 3339 UTC, so string comparison then matches
/// chronological order. Unparseable bounds pass through and match nothing
/// meaningful rather than erroring the whole listing.
fn day_start(bound: &str) -> String {
    if bound.len() == 10 {
        format!("{bound}T00:00:00+00:00")
    } else {
        normalize_bound(bound)
    }
}

fn day_end(bound: &str) -> String {
    if bound.len() == 10 {
        format!("{bound}T23:59:59+00:00")
    } else {
        normalize_bound(bound)
    }
}

fn normalize_bound(bound: &str) -> String {
    match bound.parse::<DateTime<Utc>>() {
        Ok(ts) => ts.to_rfc3339(),
        Err(_) => bound.to_string(),
    }
}

pub fn list_logs(conn: &Connection, filters: &LogFilters) -> Result<Vec<LogRecord>, ApiError> {
    let mut sql = String::from(
        "SELECT id, student_id, student_name, url, duration, category, timestamp
         FROM logs WHERE 1=1",
    );
    let mut params: Vec<Value> = Vec::new();

    if let Some(start) = filters.start_date.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(" AND timestamp >= ?");
        params.push(Value::Text(day_start(start)));
    }
    if let Some(end) = filters.end_date.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(" AND timestamp <= ?");
        params.push(Value::Text(day_end(end)));
    }
    if let Some(category) = filters.category.as_deref().filter(|s| !s.is_empty()) {
        sql.push_str(" AND category = ?");
        params.push(Value::Text(category.to_string()));
    }
    sql.push_str(" ORDER BY timestamp DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), map_log_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn recent_logs(conn: &Connection, limit: i64) -> Result<Vec<RecentAccess>, ApiError> {
    let mut stmt = conn.prepare(
        "SELECT student_name, url, category, duration, timestamp
         FROM logs ORDER BY timestamp DESC LIMIT ?",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(RecentAccess {
                student_name: row.get(0)?,
                url: row.get(1)?,
                category: row.get(2)?,
                duration: row.get(3)?,
                timestamp: parse_ts(4, row.get(4)?)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_log(
    conn: &Connection,
    student_id: &str,
    student_name: &str,
    url: &str,
    duration: i64,
    category: &str,
    timestamp: DateTime<Utc>,
) -> Result<LogRecord, ApiError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO logs(id, student_id, student_name, url, duration, category, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            student_id,
            student_name,
            url,
            duration,
            category,
            timestamp.to_rfc3339(),
        ),
    )?;
    Ok(LogRecord {
        id,
        student_id: student_id.to_string(),
        student_name: student_name.to_string(),
        url: url.to_string(),
        duration,
        category: category.to_string(),
        timestamp,
    })
}

// ---------------------------------------------------------------------------
// Sessions

pub fn create_session(
    conn: &Connection,
    token: &str,
    professor_id: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), ApiError> {
    conn.execute(
        "INSERT INTO sessions(token, professor_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        (
            token,
            professor_id,
            created_at.to_rfc3339(),
            expires_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

/// Resolves a session token to its professor, ignoring expired rows.
pub fn session_professor(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<Professor>, ApiError> {
    let row = conn
        .query_row(
            "SELECT p.id, p.full_name, p.username, p.email, p.is_owner, p.created_at, s.expires_at
             FROM sessions s JOIN professors p ON p.id = s.professor_id
             WHERE s.token = ?",
            [token],
            |row| {
                let professor = map_professor_row(row)?;
                let expires_at = parse_ts(6, row.get(6)?)?;
                Ok((professor, expires_at))
            },
        )
        .optional()?;

    Ok(match row {
        Some((professor, expires_at)) if expires_at > now => Some(professor),
        _ => None,
    })
}

pub fn delete_session(conn: &Connection, token: &str) -> Result<(), ApiError> {
    conn.execute("DELETE FROM sessions WHERE token = ?", [token])?;
    Ok(())
}

pub fn delete_sessions_for(conn: &Connection, professor_id: &str) -> Result<(), ApiError> {
    conn.execute("DELETE FROM sessions WHERE professor_id = ?", [professor_id])?;
    Ok(())
}

pub fn purge_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> Result<(), ApiError> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?",
        [now.to_rfc3339()],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Password-reset tokens

pub fn create_reset_token(
    conn: &Connection,
    token: &str,
    professor_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), ApiError> {
    conn.execute(
        "INSERT INTO reset_tokens(token, professor_id, expires_at, used) VALUES (?, ?, ?, 0)",
        (token, professor_id, expires_at.to_rfc3339()),
    )?;
    Ok(())
}

/// Single-use consume: returns the professor id only when the token exists,
/// is unexpired and unused, and marks it used in the same call. Anything else
/// returns None and changes nothing.
pub fn consume_reset_token(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, ApiError> {
    let row = conn
        .query_row(
            "SELECT professor_id, expires_at, used FROM reset_tokens WHERE token = ?",
            [token],
            |row| {
                let professor_id: String = row.get(0)?;
                let expires_at = parse_ts(1, row.get(1)?)?;
                let used: i64 = row.get(2)?;
                Ok((professor_id, expires_at, used))
            },
        )
        .optional()?;

    match row {
        Some((professor_id, expires_at, 0)) if expires_at > now => {
            conn.execute("UPDATE reset_tokens SET used = 1 WHERE token = ?", [token])?;
            Ok(Some(professor_id))
        }
        _ => Ok(None),
    }
}

/// Most recently issued reset token for a professor, used or not. The API
/// never exposes this; it backs the reset-flow tests and operator tooling.
pub fn latest_reset_token(
    conn: &Connection,
    professor_id: &str,
) -> Result<Option<String>, ApiError> {
    let token = conn
        .query_row(
            "SELECT token FROM reset_tokens WHERE professor_id = ? ORDER BY expires_at DESC LIMIT 1",
            [professor_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(token)
}

// ---------------------------------------------------------------------------
// Alert rules

pub fn load_alert_rules(conn: &Connection) -> Result<Vec<(String, String)>, ApiError> {
    let mut stmt = conn.prepare("SELECT category, bucket FROM alert_rules")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
