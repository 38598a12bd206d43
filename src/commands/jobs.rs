use serde::Serialize;
use tauri::AppHandle;

use super::with_conn;
use crate::lifecycle;
use crate::models::{
    AssignJob, CompleteJob, CreateJob, Job, JobRecord, JobStatus, UpdateJob, Validation,
};
use crate::store::jobs;

#[derive(Debug, Serialize)]
pub struct CompletedJob {
    pub job: Job,
    pub record: JobRecord,
}

#[tauri::command]
pub fn get_jobs(app: AppHandle, status: Option<JobStatus>) -> Result<Vec<Job>, String> {
    with_conn(&app, "get_jobs", |conn| match status {
        Some(status) => jobs::list_jobs_by_status(conn, status),
        None => jobs::list_jobs(conn),
    })
}

#[tauri::command]
pub fn get_job(app: AppHandle, id: String) -> Result<Job, String> {
    with_conn(&app, "get_job", |conn| jobs::get_job(conn, &id))
}

#[tauri::command]
pub fn create_job(app: AppHandle, job: CreateJob) -> Result<Job, String> {
    with_conn(&app, "create_job", |conn| jobs::create_job(conn, job))
}

#[tauri::command]
pub fn update_job(app: AppHandle, job: UpdateJob) -> Result<Job, String> {
    with_conn(&app, "update_job", |conn| jobs::update_job(conn, job))
}

/// Manual assignment from the scheduling dialog, or accepting an AI suggestion.
#[tauri::command]
pub fn assign_job(app: AppHandle, assignment: AssignJob) -> Result<Job, String> {
    with_conn(&app, "assign_job", |conn| jobs::assign_job(conn, assignment))
}

#[tauri::command]
pub fn start_job(app: AppHandle, id: String) -> Result<Job, String> {
    with_conn(&app, "start_job", |conn| jobs::start_job(conn, &id))
}

/// Lets the completion dialog disable its submit button before any write.
#[tauri::command]
pub fn validate_job_completion(price_charged: f64) -> Validation {
    lifecycle::validate_completion(price_charged)
}

#[tauri::command]
pub fn complete_job(app: AppHandle, completion: CompleteJob) -> Result<CompletedJob, String> {
    with_conn(&app, "complete_job", |conn| {
        let (job, record) = jobs::complete_job(conn, completion)?;
        Ok(CompletedJob { job, record })
    })
}

#[tauri::command]
pub fn delete_job(app: AppHandle, id: String) -> Result<(), String> {
    with_conn(&app, "delete_job", |conn| jobs::delete_job(conn, &id))
}
