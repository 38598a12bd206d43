use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{json_list, new_id, now_timestamp, to_json_list};
use crate::error::{AppError, Result};
use crate::lifecycle;
use crate::models::{AssignJob, CompleteJob, CreateJob, Job, JobRecord, JobStatus, UpdateJob};
use crate::store::{clients, job_records, staff};

const JOB_COLUMNS: &str = "id, client_name, address, date, time, description, status, cleaner_ids,
     estimated_duration, quoted_price, estimated_value, notes, completed_at, price_charged, created_at";

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        id: row.get(0)?,
        client_name: row.get(1)?,
        address: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        description: row.get(5)?,
        status: row.get(6)?,
        cleaner_ids: json_list(row.get(7)?, 7)?,
        estimated_duration: row.get(8)?,
        quoted_price: row.get(9)?,
        estimated_value: row.get(10)?,
        notes: row.get(11)?,
        completed_at: row.get(12)?,
        price_charged: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// All jobs, dated ones first in calendar order.
pub fn list_jobs(conn: &Connection) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {JOB_COLUMNS} FROM jobs ORDER BY date = '', date, time, created_at"
    ))?;
    let jobs = stmt
        .query_map([], job_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(jobs)
}

pub fn list_jobs_by_status(conn: &Connection, status: JobStatus) -> Result<Vec<Job>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {JOB_COLUMNS} FROM jobs WHERE status = ?1 ORDER BY date = '', date, time, created_at"
    ))?;
    let jobs = stmt
        .query_map([status], job_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(jobs)
}

pub fn get_job(conn: &Connection, id: &str) -> Result<Job> {
    conn.query_row(
        &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
        [id],
        job_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Job", id))
}

pub fn create_job(conn: &Connection, job: CreateJob) -> Result<Job> {
    let date = job.date.unwrap_or_default().trim().to_string();
    let time = job.time.unwrap_or_default().trim().to_string();
    lifecycle::validate_job_fields(&job.client_name, &date, &time, job.estimated_duration)
        .into_result()?;
    ensure_assignable(conn, &[], &job.cleaner_ids)?;

    let status = lifecycle::initial_status(&date, &time, &job.cleaner_ids);
    let id = new_id();

    conn.execute(
        "INSERT INTO jobs (id, client_name, address, date, time, description, status, cleaner_ids,
                           estimated_duration, quoted_price, estimated_value, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            job.client_name.trim(),
            job.address,
            date,
            time,
            job.description,
            status,
            to_json_list(&job.cleaner_ids)?,
            job.estimated_duration,
            job.quoted_price,
            job.estimated_value,
            job.notes,
            now_timestamp(),
        ],
    )?;

    tracing::info!(job_id = %id, client = %job.client_name, %status, "Job created");
    get_job(conn, &id)
}

fn save_job(conn: &Connection, job: &Job) -> Result<()> {
    let changed = conn.execute(
        "UPDATE jobs SET client_name = ?1, address = ?2, date = ?3, time = ?4, description = ?5, status = ?6,
                         cleaner_ids = ?7, estimated_duration = ?8, quoted_price = ?9, estimated_value = ?10,
                         notes = ?11, completed_at = ?12, price_charged = ?13
         WHERE id = ?14",
        params![
            job.client_name,
            job.address,
            job.date,
            job.time,
            job.description,
            job.status,
            to_json_list(&job.cleaner_ids)?,
            job.estimated_duration,
            job.quoted_price,
            job.estimated_value,
            job.notes,
            job.completed_at,
            job.price_charged,
            job.id,
        ],
    )?;

    if changed == 0 {
        return Err(AppError::not_found("Job", job.id.clone()));
    }
    Ok(())
}

/// Newly added staff must exist and must not be archived. Members already on
/// the job stay assignable after being archived, so the job remains editable.
fn ensure_assignable(conn: &Connection, current: &[String], requested: &[String]) -> Result<()> {
    let added = requested
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && !current.iter().any(|c| c == id));

    for id in added {
        let member = staff::get_staff(conn, id)?;
        if member.archived {
            return Err(AppError::validation(format!(
                "{} is archived and cannot be assigned",
                member.name
            )));
        }
    }
    Ok(())
}

pub fn update_job(conn: &Connection, update: UpdateJob) -> Result<Job> {
    let mut job = get_job(conn, &update.id)?;
    ensure_assignable(conn, &job.cleaner_ids, &update.cleaner_ids)?;

    lifecycle::apply_update(&mut job, &update)?;
    save_job(conn, &job)?;

    tracing::debug!(job_id = %job.id, status = %job.status, "Job updated");
    Ok(job)
}

pub fn assign_job(conn: &Connection, assignment: AssignJob) -> Result<Job> {
    let mut job = get_job(conn, &assignment.job_id)?;
    ensure_assignable(conn, &job.cleaner_ids, &assignment.cleaner_ids)?;

    lifecycle::assign(&mut job, &assignment)?;
    save_job(conn, &job)?;

    tracing::info!(job_id = %job.id, cleaners = ?job.cleaner_ids, date = %job.date, "Job scheduled");
    Ok(job)
}

pub fn start_job(conn: &Connection, id: &str) -> Result<Job> {
    let mut job = get_job(conn, id)?;

    lifecycle::start(&mut job)?;
    save_job(conn, &job)?;

    tracing::info!(job_id = %id, "Job started");
    Ok(job)
}

/// Finalise a job: mark it Completed and append it to the job register.
/// Both writes commit together; client aggregates are refreshed afterwards
/// on a best-effort basis.
pub fn complete_job(conn: &Connection, completion: CompleteJob) -> Result<(Job, JobRecord)> {
    let tx = conn.unchecked_transaction()?;

    let mut job = get_job(&tx, &completion.job_id)?;
    lifecycle::complete(
        &mut job,
        completion.price_charged,
        completion.notes,
        completion.completed_at.as_deref(),
    )?;
    save_job(&tx, &job)?;

    let staff_names = staff::staff_names(&tx, &job.cleaner_ids)?;
    let record = job_records::append_record(&tx, &job, staff_names)?;

    tx.commit()?;

    tracing::info!(
        job_id = %job.id,
        record_id = %record.id,
        price = record.price_charged,
        "Job completed"
    );

    if let Err(e) = clients::refresh_client_stats(conn, &job.client_name) {
        tracing::warn!(client = %job.client_name, error = %e, "Failed to refresh client stats");
    }

    Ok((job, record))
}

pub fn delete_job(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Job", id));
    }

    tracing::info!(job_id = %id, "Job deleted");
    Ok(())
}
