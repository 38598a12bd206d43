//! Job state machine.
//!
//! Unscheduled -> Scheduled -> In Progress -> Completed. A Scheduled job may
//! be re-assigned and may be completed directly. Nothing moves backwards and
//! there is no cancellation.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::{AppError, Result};
use crate::models::{parse_date, parse_time, AssignJob, Job, JobStatus, UpdateJob, Validation};

/// Date, time and at least one cleaner are all present.
pub fn has_slot(date: &str, time: &str, cleaner_ids: &[String]) -> bool {
    !date.trim().is_empty()
        && !time.trim().is_empty()
        && cleaner_ids.iter().any(|id| !id.trim().is_empty())
}

pub fn initial_status(date: &str, time: &str, cleaner_ids: &[String]) -> JobStatus {
    if has_slot(date, time, cleaner_ids) {
        JobStatus::Scheduled
    } else {
        JobStatus::Unscheduled
    }
}

pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Unscheduled, Scheduled)
            | (Scheduled, Scheduled)
            | (Scheduled, InProgress)
            | (Scheduled, Completed)
            | (InProgress, Completed)
    )
}

pub fn check_transition(from: JobStatus, to: JobStatus) -> Result<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

/// Longest estimate accepted for a single job, in minutes.
pub const MAX_JOB_MINUTES: u32 = 24 * 60;

/// Field checks shared by create and edit forms. Empty date/time is allowed
/// here; whether the job can be Scheduled is decided separately.
pub fn validate_job_fields(
    client_name: &str,
    date: &str,
    time: &str,
    estimated_duration: Option<u32>,
) -> Validation {
    let mut errors = Vec::new();

    if client_name.trim().is_empty() {
        errors.push("Client name is required".to_string());
    }
    if !date.trim().is_empty() && parse_date(date).is_none() {
        errors.push(format!("Invalid date '{date}', expected YYYY-MM-DD"));
    }
    if !time.trim().is_empty() && parse_time(time).is_none() {
        errors.push(format!("Invalid time '{time}', expected HH:MM"));
    }
    if let Some(minutes) = estimated_duration {
        if !(1..=MAX_JOB_MINUTES).contains(&minutes) {
            errors.push(format!(
                "Estimated duration must be between 1 and {MAX_JOB_MINUTES} minutes"
            ));
        }
    }

    Validation::from_errors(errors)
}

pub fn validate_assignment(date: &str, time: &str, cleaner_ids: &[String]) -> Validation {
    let mut errors = Vec::new();

    if date.trim().is_empty() {
        errors.push("A date is required to schedule a job".to_string());
    } else if parse_date(date).is_none() {
        errors.push(format!("Invalid date '{date}', expected YYYY-MM-DD"));
    }
    if time.trim().is_empty() {
        errors.push("A start time is required to schedule a job".to_string());
    } else if parse_time(time).is_none() {
        errors.push(format!("Invalid time '{time}', expected HH:MM"));
    }
    if !cleaner_ids.iter().any(|id| !id.trim().is_empty()) {
        errors.push("At least one staff member must be assigned".to_string());
    }

    Validation::from_errors(errors)
}

pub fn validate_completion(price_charged: f64) -> Validation {
    let mut errors = Vec::new();

    if !price_charged.is_finite() || price_charged <= 0.0 {
        errors.push("Price charged must be greater than zero".to_string());
    }

    Validation::from_errors(errors)
}

fn clean_ids(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()) {
        if !id.is_empty() && !out.iter().any(|o| o == id) {
            out.push(id.to_string());
        }
    }
    out
}

/// Manual assignment, or accepting a smart-allocation suggestion.
pub fn assign(job: &mut Job, assignment: &AssignJob) -> Result<()> {
    check_transition(job.status, JobStatus::Scheduled)?;
    validate_assignment(&assignment.date, &assignment.time, &assignment.cleaner_ids)
        .into_result()?;

    job.date = assignment.date.trim().to_string();
    job.time = assignment.time.trim().to_string();
    job.cleaner_ids = clean_ids(&assignment.cleaner_ids);
    job.status = JobStatus::Scheduled;

    Ok(())
}

pub fn start(job: &mut Job) -> Result<()> {
    check_transition(job.status, JobStatus::InProgress)?;
    job.status = JobStatus::InProgress;
    Ok(())
}

/// Mark the job Completed. `completed_at` may be RFC 3339 or a bare date;
/// when absent the scheduled slot is used, falling back to now.
pub fn complete(
    job: &mut Job,
    price_charged: f64,
    notes: Option<String>,
    completed_at: Option<&str>,
) -> Result<()> {
    check_transition(job.status, JobStatus::Completed)?;
    validate_completion(price_charged).into_result()?;

    let completed_at = match completed_at.filter(|s| !s.trim().is_empty()) {
        Some(raw) => normalize_timestamp(raw)
            .ok_or_else(|| AppError::validation(format!("Invalid completion time '{raw}'")))?,
        None => slot_timestamp(job).unwrap_or_else(|| Utc::now().to_rfc3339()),
    };

    job.status = JobStatus::Completed;
    job.price_charged = Some(price_charged);
    job.completed_at = Some(completed_at);
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        job.notes = Some(notes);
    }

    Ok(())
}

/// Apply an edit form. Completed jobs are frozen; an active job cannot lose
/// its slot; an Unscheduled job that gains a full slot becomes Scheduled.
pub fn apply_update(job: &mut Job, update: &UpdateJob) -> Result<()> {
    if job.status == JobStatus::Completed {
        return Err(AppError::validation("Completed jobs cannot be edited"));
    }

    let date = update.date.clone().unwrap_or_default();
    let time = update.time.clone().unwrap_or_default();
    validate_job_fields(&update.client_name, &date, &time, update.estimated_duration)
        .into_result()?;

    let cleaner_ids = clean_ids(&update.cleaner_ids);
    let slot = has_slot(&date, &time, &cleaner_ids);

    let status = match job.status {
        JobStatus::Unscheduled if slot => JobStatus::Scheduled,
        JobStatus::Unscheduled => JobStatus::Unscheduled,
        active if slot => active,
        _ => {
            return Err(AppError::validation(
                "A scheduled job must keep its date, time and assigned staff",
            ))
        }
    };

    job.client_name = update.client_name.trim().to_string();
    job.address = update.address.clone();
    job.date = date.trim().to_string();
    job.time = time.trim().to_string();
    job.description = update.description.clone();
    job.cleaner_ids = cleaner_ids;
    job.estimated_duration = update.estimated_duration;
    job.quoted_price = update.quoted_price;
    job.estimated_value = update.estimated_value;
    job.notes = update.notes.clone();
    job.status = status;

    Ok(())
}

pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return local_rfc3339(ndt);
    }
    parse_date(raw)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(local_rfc3339)
}

fn slot_timestamp(job: &Job) -> Option<String> {
    let ndt = job.scheduled_date()?.and_time(job.start_time()?);
    local_rfc3339(ndt)
}

fn local_rfc3339(ndt: NaiveDateTime) -> Option<String> {
    Local
        .from_local_datetime(&ndt)
        .earliest()
        .map(|dt| dt.to_rfc3339())
}
