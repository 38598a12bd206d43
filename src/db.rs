use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{AppError, Result};

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::LockPoisoned)
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Staff roster
            CREATE TABLE IF NOT EXISTS staff (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                position TEXT NOT NULL DEFAULT 'Staff',
                skills TEXT NOT NULL DEFAULT '[]',
                location TEXT NOT NULL DEFAULT '',
                availability TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            -- Clients with denormalised aggregates
            CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                address TEXT,
                avatar TEXT,
                upcoming_jobs INTEGER NOT NULL DEFAULT 0,
                total_spent REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Cleaning jobs; cleaner_ids is a JSON array of staff ids
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL DEFAULT '',
                time TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Unscheduled',
                cleaner_ids TEXT NOT NULL DEFAULT '[]',
                estimated_duration INTEGER,
                quoted_price REAL,
                estimated_value REAL,
                notes TEXT,
                created_at TEXT NOT NULL
            );

            -- Append-only register of completed jobs
            CREATE TABLE IF NOT EXISTS job_records (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL,
                client_name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL DEFAULT '',
                time TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                staff TEXT NOT NULL DEFAULT '[]',
                price_charged REAL NOT NULL,
                notes TEXT,
                completed_at TEXT NOT NULL
            );

            -- Purchase records
            CREATE TABLE IF NOT EXISTS consumables (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                purchased_from TEXT NOT NULL DEFAULT '',
                purchase_amount REAL NOT NULL,
                date_purchased TEXT NOT NULL,
                receipt_path TEXT,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS invoices (
                id TEXT PRIMARY KEY,
                number TEXT NOT NULL UNIQUE,
                client_name TEXT NOT NULL,
                amount REAL NOT NULL,
                issue_date TEXT NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending',
                paid_date TEXT,
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS bills (
                id TEXT PRIMARY KEY,
                supplier TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                amount REAL NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Unpaid',
                paid_date TEXT
            );

            CREATE TABLE IF NOT EXISTS quotes (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                valid_until TEXT,
                status TEXT NOT NULL DEFAULT 'Draft'
            );

            -- Business settings
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Columns added after the first release (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        ensure_column(conn, "staff", "avatar", "TEXT")?;
        ensure_column(conn, "staff", "archived", "INTEGER NOT NULL DEFAULT 0")?;
        ensure_column(conn, "jobs", "completed_at", "TEXT")?;
        ensure_column(conn, "jobs", "price_charged", "REAL")?;

        Ok(())
    }
}

fn ensure_column(conn: &Connection, table: &str, column: &str, ddl: &str) -> Result<()> {
    let columns: Vec<String> = conn
        .prepare(&format!("PRAGMA table_info({table})"))?
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|r| r.ok())
        .collect();

    if !columns.iter().any(|c| c == column) {
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {ddl}"), [])?;
        tracing::info!(table, column, "Added missing column");
    }

    Ok(())
}

/// Fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as stored in timestamp columns (RFC 3339, UTC).
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn to_json_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decode a JSON array column inside a row mapper.
pub(crate) fn json_list(raw: String, column: usize) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(feature = "desktop")]
mod app {
    use super::Database;
    use crate::config::AppConfig;
    use tauri::{AppHandle, Manager};

    pub trait DatabaseExt {
        fn db(&self) -> &Database;
        fn app_config(&self) -> &AppConfig;
    }

    impl DatabaseExt for AppHandle {
        fn db(&self) -> &Database {
            self.state::<Database>().inner()
        }

        fn app_config(&self) -> &AppConfig {
            self.state::<AppConfig>().inner()
        }
    }
}

#[cfg(feature = "desktop")]
pub use app::DatabaseExt;
