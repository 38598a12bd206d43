use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{new_id, now_timestamp};
use crate::error::{AppError, Result};
use crate::models::{Client, CreateClient, UpdateClient};

const CLIENT_COLUMNS: &str =
    "id, name, email, phone, address, avatar, upcoming_jobs, total_spent, created_at";

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        avatar: row.get(5)?,
        upcoming_jobs: row.get(6)?,
        total_spent: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn list_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name"
    ))?;
    let clients = stmt
        .query_map([], client_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(clients)
}

pub fn get_client(conn: &Connection, id: &str) -> Result<Client> {
    conn.query_row(
        &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
        [id],
        client_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Client", id))
}

pub fn create_client(conn: &Connection, client: CreateClient) -> Result<Client> {
    if client.name.trim().is_empty() {
        return Err(AppError::validation("Client name is required"));
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO clients (id, name, email, phone, address, avatar, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            client.name.trim(),
            client.email,
            client.phone,
            client.address,
            client.avatar,
            now_timestamp(),
        ],
    )?;

    // Pick up any jobs already booked under this name
    refresh_client_stats(conn, client.name.trim())?;
    get_client(conn, &id)
}

pub fn update_client(conn: &Connection, client: UpdateClient) -> Result<Client> {
    if client.name.trim().is_empty() {
        return Err(AppError::validation("Client name is required"));
    }

    let changed = conn.execute(
        "UPDATE clients SET name = ?1, email = ?2, phone = ?3, address = ?4, avatar = ?5 WHERE id = ?6",
        params![
            client.name.trim(),
            client.email,
            client.phone,
            client.address,
            client.avatar,
            client.id,
        ],
    )?;

    if changed == 0 {
        return Err(AppError::not_found("Client", client.id));
    }

    get_client(conn, &client.id)
}

pub fn delete_client(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM clients WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Client", id));
    }
    Ok(())
}

/// Recompute the denormalised counters for every client row with this name:
/// open jobs dated today or later, and lifetime register revenue.
pub fn refresh_client_stats(conn: &Connection, client_name: &str) -> Result<usize> {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let upcoming: i64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs
         WHERE client_name = ?1 AND status != 'Completed' AND date != '' AND date >= ?2",
        params![client_name, today],
        |row| row.get(0),
    )?;

    let total_spent: f64 = conn.query_row(
        "SELECT COALESCE(SUM(price_charged), 0) FROM job_records WHERE client_name = ?1",
        [client_name],
        |row| row.get(0),
    )?;

    let changed = conn.execute(
        "UPDATE clients SET upcoming_jobs = ?1, total_spent = ?2 WHERE name = ?3",
        params![upcoming, total_spent, client_name],
    )?;

    if changed == 0 {
        tracing::debug!(client = %client_name, "No client record to refresh");
    }

    Ok(changed)
}
