use rusqlite::{params, Connection, OptionalExtension};

use crate::config::AppConfig;
use crate::error::Result;
use crate::models::Setting;

pub const COMPANY_NAME: &str = "company_name";
pub const ABN: &str = "abn";
pub const DEFAULT_JOB_MINUTES: &str = "default_job_minutes";

pub fn list_settings(conn: &Connection) -> Result<Vec<Setting>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let settings = stmt
        .query_map([], |row| {
            Ok(Setting {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(settings)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Duration used for jobs without an estimate: the stored setting when it
/// parses, else the configured default.
pub fn default_job_minutes(conn: &Connection, config: &AppConfig) -> Result<u32> {
    let stored = get_setting(conn, DEFAULT_JOB_MINUTES)?;
    Ok(stored
        .and_then(|v| v.trim().parse().ok())
        .filter(|&m: &u32| m > 0)
        .unwrap_or(config.default_job_minutes))
}
