use chrono::NaiveDate;
use tauri::AppHandle;

use super::with_conn;
use crate::db::DatabaseExt;
use crate::error::AppError;
use crate::models::{parse_date, JobStatus};
use crate::schedule::{self, Conflict, WeeklySchedule};
use crate::store::{jobs, settings, staff};

fn parse_week_of(raw: Option<&str>) -> crate::Result<NaiveDate> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(s).ok_or_else(|| AppError::validation(format!("Invalid date '{s}'"))),
        None => Ok(schedule::current_week_start()),
    }
}

fn load_week(app: &AppHandle, action: &str, raw: Option<&str>) -> Result<WeeklySchedule, String> {
    with_conn(app, action, |conn| {
        let day = parse_week_of(raw)?;
        let scheduled = jobs::list_jobs_by_status(conn, JobStatus::Scheduled)?;
        let roster = staff::list_staff(conn, false)?;
        let default_minutes = settings::default_job_minutes(conn, app.app_config())?;
        Ok(schedule::build_week(&scheduled, &roster, day, default_minutes))
    })
}

/// Staff calendar for the week containing `week_of` (default: this week).
#[tauri::command]
pub fn get_week_schedule(app: AppHandle, week_of: Option<String>) -> Result<WeeklySchedule, String> {
    load_week(&app, "get_week_schedule", week_of.as_deref())
}

#[tauri::command]
pub fn get_schedule_conflicts(
    app: AppHandle,
    week_of: Option<String>,
) -> Result<Vec<Conflict>, String> {
    let week = load_week(&app, "get_schedule_conflicts", week_of.as_deref())?;
    Ok(schedule::find_conflicts(&week))
}
