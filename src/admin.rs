//! Maintenance operations behind `cleandesk-admin`.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::db::{json_list, to_json_list};
use crate::error::{AppError, Result};
use crate::models::{CreateStaff, Staff};
use crate::store::staff;

#[derive(Debug, Serialize)]
pub struct DedupeReport {
    pub kept: Staff,
    pub removed: Vec<String>,
    pub jobs_updated: usize,
}

/// Collapse staff rows sharing an email into the oldest one. Jobs that
/// referenced a removed id are pointed at the kept id.
pub fn dedupe_staff(conn: &Connection, email: &str) -> Result<DedupeReport> {
    let mut matches = staff::find_by_email(conn, email)?.into_iter();
    let kept = matches
        .next()
        .ok_or_else(|| AppError::not_found("Staff member with email", email))?;
    let removed: Vec<String> = matches.map(|s| s.id).collect();

    if removed.is_empty() {
        return Ok(DedupeReport {
            kept,
            removed,
            jobs_updated: 0,
        });
    }

    let tx = conn.unchecked_transaction()?;

    let jobs: Vec<(String, Vec<String>)> = {
        let mut stmt = tx.prepare("SELECT id, cleaner_ids FROM jobs")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, json_list(row.get(1)?, 1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let mut jobs_updated = 0;
    for (job_id, ids) in jobs {
        if !ids.iter().any(|id| removed.contains(id)) {
            continue;
        }

        let mut rewritten: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = if removed.contains(&id) { kept.id.clone() } else { id };
            if !rewritten.contains(&id) {
                rewritten.push(id);
            }
        }

        tx.execute(
            "UPDATE jobs SET cleaner_ids = ?1 WHERE id = ?2",
            params![to_json_list(&rewritten)?, job_id],
        )?;
        jobs_updated += 1;
    }

    for id in &removed {
        tx.execute("DELETE FROM staff WHERE id = ?1", [id])?;
    }

    tx.commit()?;

    tracing::info!(email, kept = %kept.id, removed = removed.len(), jobs_updated, "Deduplicated staff");
    Ok(DedupeReport {
        kept,
        removed,
        jobs_updated,
    })
}

/// Re-insert a staff member by email if no record exists; returns the
/// existing oldest record otherwise.
pub fn ensure_staff(conn: &Connection, new_staff: CreateStaff) -> Result<(Staff, bool)> {
    if let Some(existing) = staff::find_by_email(conn, &new_staff.email)?.into_iter().next() {
        return Ok((existing, false));
    }
    let created = staff::create_staff(conn, new_staff)?;
    Ok((created, true))
}
