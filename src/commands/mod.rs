pub mod assistant;
pub mod clients;
pub mod consumables;
pub mod finance;
pub mod jobs;
pub mod reports;
pub mod schedule;
pub mod staff;

use rusqlite::Connection;
use tauri::AppHandle;

use crate::db::DatabaseExt;

/// Run `f` against the locked connection. Failures are logged and turned
/// into the message the frontend shows in its toast.
pub(crate) fn with_conn<T>(
    app: &AppHandle,
    action: &str,
    f: impl FnOnce(&Connection) -> crate::Result<T>,
) -> Result<T, String> {
    let result = app.db().lock().and_then(|conn| f(&conn));
    to_ui(action, result)
}

pub(crate) fn to_ui<T>(action: &str, result: crate::Result<T>) -> Result<T, String> {
    result.map_err(|e| {
        tracing::error!(action, error = %e, "Command failed");
        e.to_string()
    })
}
