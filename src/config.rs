use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub session_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("CLASSWATCH_PORT", "3000"),
            db_path: PathBuf::from(try_load::<String>(
                "CLASSWATCH_DB",
                "classwatch.sqlite3",
            )),
            session_ttl_hours: try_load("CLASSWATCH_SESSION_TTL_HOURS", "24"),
            reset_ttl_minutes: try_load("CLASSWATCH_RESET_TTL_MINUTES", "30"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
