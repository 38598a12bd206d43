//! The job register: an append-only log of completed jobs used for revenue
//! reporting. Records are never updated or deleted.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;

use crate::db::{json_list, new_id, to_json_list};
use crate::error::{AppError, Result};
use crate::format::format_month;
use crate::models::{Job, JobRecord, MonthlyRevenue};

const RECORD_COLUMNS: &str =
    "id, job_id, client_name, description, date, time, address, staff, price_charged, notes, completed_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        client_name: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        address: row.get(6)?,
        staff: json_list(row.get(7)?, 7)?,
        price_charged: row.get(8)?,
        notes: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

/// Copy a completed job into the register. `staff` holds display names so
/// the entry survives later roster changes.
pub fn append_record(conn: &Connection, job: &Job, staff: Vec<String>) -> Result<JobRecord> {
    let (Some(price_charged), Some(completed_at)) = (job.price_charged, job.completed_at.clone())
    else {
        return Err(AppError::validation(
            "Only finalised jobs can be added to the register",
        ));
    };

    let record = JobRecord {
        id: new_id(),
        job_id: job.id.clone(),
        client_name: job.client_name.clone(),
        description: job.description.clone(),
        date: job.date.clone(),
        time: job.time.clone(),
        address: job.address.clone(),
        staff,
        price_charged,
        notes: job.notes.clone(),
        completed_at,
    };

    conn.execute(
        &format!("INSERT INTO job_records ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
        params![
            record.id,
            record.job_id,
            record.client_name,
            record.description,
            record.date,
            record.time,
            record.address,
            to_json_list(&record.staff)?,
            record.price_charged,
            record.notes,
            record.completed_at,
        ],
    )?;

    Ok(record)
}

pub fn list_records(conn: &Connection) -> Result<Vec<JobRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM job_records"
    ))?;
    let mut records = stmt
        .query_map([], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    sort_newest_first(&mut records);
    Ok(records)
}

pub fn records_for_client(conn: &Connection, client_name: &str) -> Result<Vec<JobRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM job_records WHERE client_name = ?1"
    ))?;
    let mut records = stmt
        .query_map([client_name], record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    sort_newest_first(&mut records);
    Ok(records)
}

/// Completion times carry mixed offsets, so order by instant rather than text.
/// Unreadable timestamps sort last.
fn sort_newest_first(records: &mut [JobRecord]) {
    records.sort_by_cached_key(|r| {
        std::cmp::Reverse(
            DateTime::parse_from_rfc3339(&r.completed_at)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        )
    });
}

/// `YYYY-MM` of the completion time, in the offset it was recorded with.
pub fn completion_month(completed_at: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(completed_at)
        .ok()
        .map(|dt| dt.format("%Y-%m").to_string())
}

/// Register grouped by completion month, newest month first.
pub fn monthly_revenue(conn: &Connection) -> Result<Vec<MonthlyRevenue>> {
    let mut months: BTreeMap<String, Vec<JobRecord>> = BTreeMap::new();

    for record in list_records(conn)? {
        match completion_month(&record.completed_at) {
            Some(month) => months.entry(month).or_default().push(record),
            None => {
                tracing::warn!(record_id = %record.id, completed_at = %record.completed_at, "Unreadable completion time");
            }
        }
    }

    let summary = months
        .into_iter()
        .rev()
        .map(|(month, records)| MonthlyRevenue {
            label: format_month(&month),
            job_count: records.len() as i64,
            revenue: records.iter().map(|r| r.price_charged).sum(),
            month,
            records,
        })
        .collect();

    Ok(summary)
}
