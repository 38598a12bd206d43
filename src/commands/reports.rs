use tauri::AppHandle;

use super::with_conn;
use crate::models::{JobRecord, MonthlyRevenue, Setting};
use crate::store::{job_records, settings};

#[tauri::command]
pub fn get_job_register(app: AppHandle) -> Result<Vec<JobRecord>, String> {
    with_conn(&app, "get_job_register", job_records::list_records)
}

/// Register grouped by completion month, newest first.
#[tauri::command]
pub fn get_monthly_revenue(app: AppHandle) -> Result<Vec<MonthlyRevenue>, String> {
    with_conn(&app, "get_monthly_revenue", job_records::monthly_revenue)
}

#[tauri::command]
pub fn get_settings(app: AppHandle) -> Result<Vec<Setting>, String> {
    with_conn(&app, "get_settings", settings::list_settings)
}

#[tauri::command]
pub fn set_setting(app: AppHandle, key: String, value: String) -> Result<(), String> {
    with_conn(&app, "set_setting", |conn| {
        settings::set_setting(conn, &key, &value)
    })
}
