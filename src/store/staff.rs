use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{json_list, new_id, now_timestamp, to_json_list};
use crate::error::{AppError, Result};
use crate::models::{CreateStaff, Staff, UpdateStaff};

const STAFF_COLUMNS: &str =
    "id, name, email, position, skills, location, availability, avatar, archived, created_at";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        position: row.get(3)?,
        skills: json_list(row.get(4)?, 4)?,
        location: row.get(5)?,
        availability: row.get(6)?,
        avatar: row.get(7)?,
        archived: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Roster ordered by name. Archived members are only included on request.
pub fn list_staff(conn: &Connection, include_archived: bool) -> Result<Vec<Staff>> {
    let sql = if include_archived {
        format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY name")
    } else {
        format!("SELECT {STAFF_COLUMNS} FROM staff WHERE archived = 0 ORDER BY name")
    };

    let mut stmt = conn.prepare(&sql)?;
    let staff = stmt
        .query_map([], staff_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(staff)
}

pub fn get_staff(conn: &Connection, id: &str) -> Result<Staff> {
    conn.query_row(
        &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
        [id],
        staff_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Staff member", id))
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Vec<Staff>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff WHERE lower(email) = lower(?1) ORDER BY created_at, id"
    ))?;
    let staff = stmt
        .query_map([email.trim()], staff_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(staff)
}

fn validate(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Staff name is required"));
    }
    if !email.contains('@') {
        return Err(AppError::validation(format!("Invalid email '{email}'")));
    }
    Ok(())
}

pub fn create_staff(conn: &Connection, staff: CreateStaff) -> Result<Staff> {
    validate(&staff.name, &staff.email)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO staff (id, name, email, position, skills, location, availability, avatar, archived, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
        params![
            id,
            staff.name.trim(),
            staff.email.trim(),
            staff.position,
            to_json_list(&staff.skills)?,
            staff.location,
            staff.availability,
            staff.avatar,
            now_timestamp(),
        ],
    )?;

    tracing::info!(staff_id = %id, name = %staff.name, "Staff member created");
    get_staff(conn, &id)
}

pub fn update_staff(conn: &Connection, staff: UpdateStaff) -> Result<Staff> {
    validate(&staff.name, &staff.email)?;

    let changed = conn.execute(
        "UPDATE staff SET name = ?1, email = ?2, position = ?3, skills = ?4, location = ?5, availability = ?6, avatar = ?7
         WHERE id = ?8",
        params![
            staff.name.trim(),
            staff.email.trim(),
            staff.position,
            to_json_list(&staff.skills)?,
            staff.location,
            staff.availability,
            staff.avatar,
            staff.id,
        ],
    )?;

    if changed == 0 {
        return Err(AppError::not_found("Staff member", staff.id));
    }

    get_staff(conn, &staff.id)
}

/// Soft delete. Archived staff drop out of scheduling and allocation but
/// stay on past jobs and register entries.
pub fn set_archived(conn: &Connection, id: &str, archived: bool) -> Result<Staff> {
    let changed = conn.execute(
        "UPDATE staff SET archived = ?1 WHERE id = ?2",
        params![archived, id],
    )?;

    if changed == 0 {
        return Err(AppError::not_found("Staff member", id));
    }

    tracing::info!(staff_id = %id, archived, "Staff archive flag changed");
    get_staff(conn, id)
}

/// Number of Scheduled / In Progress jobs that list this staff member.
pub fn active_assignment_count(conn: &Connection, id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM jobs
         WHERE status IN ('Scheduled', 'In Progress')
           AND EXISTS (SELECT 1 FROM json_each(jobs.cleaner_ids) WHERE json_each.value = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn delete_staff(conn: &Connection, id: &str) -> Result<()> {
    if active_assignment_count(conn, id)? > 0 {
        return Err(AppError::validation(
            "Cannot delete staff member with scheduled jobs; archive them instead",
        ));
    }

    let changed = conn.execute("DELETE FROM staff WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Staff member", id));
    }

    tracing::info!(staff_id = %id, "Staff member deleted");
    Ok(())
}

/// Display names for the given ids, in order. Unknown ids are kept as-is so
/// a register entry never loses an assignee.
pub fn staff_names(conn: &Connection, ids: &[String]) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM staff WHERE id = ?1")?;
    let mut names = Vec::with_capacity(ids.len());

    for id in ids {
        let name: Option<String> = stmt.query_row([id], |row| row.get(0)).optional()?;
        names.push(name.unwrap_or_else(|| id.clone()));
    }

    Ok(names)
}
